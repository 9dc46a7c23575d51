//! HL7 message data model.
//!
//! This module provides the nested container types that make up an HL7 v2
//! message. Each level is an ordered sequence of the level below:
//!
//! - [`Message`]: segments, plus the delimiters the message uses
//! - [`Segment`]: fields; index 0 holds the segment tag (e.g. `PID`)
//! - [`Field`]: field repetitions ([`FieldItem`]s)
//! - [`FieldItem`]: components
//! - [`Component`]: subcomponents
//! - [`Subcomponent`]: the leaf text value
//!
//! Because the tag occupies index 0, HL7 field `n` of a segment lives at
//! index `n`. Containers are plain values: nothing holds a reference to its
//! parent and mutation goes through by-value builders that return the new
//! container.
//!
//! # Example
//!
//! ```
//! use hl7quill::document::node::{Component, Field, FieldItem, Segment};
//!
//! let name = Field::new(vec![FieldItem::new(vec![
//!     Component::from_value("Doe"),
//!     Component::from_value("John"),
//! ])]);
//! let segment = Segment::new("PID").push_field(Field::from_value("1")).push_field(name);
//!
//! assert_eq!(segment.tag(), "PID");
//! assert_eq!(segment.to_string(), "PID|1|Doe^John");
//! ```

use serde::{Deserialize, Serialize};

use super::error::ParseError;
use crate::config::Delimiters;

/// Tag of the header segment whose field separator is embedded in its text.
pub const HEADER_TAG: &str = "MSH";

/// A leaf text value. May be empty.
pub type Subcomponent = String;

/// A component: an ordered sequence of subcomponents.
///
/// The empty component is `[""]`, which is what an empty piece of text parses to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Component {
    subcomponents: Vec<Subcomponent>,
}

impl Component {
    pub fn new(subcomponents: Vec<Subcomponent>) -> Self {
        Self { subcomponents }
    }

    /// Creates a component holding a single leaf value.
    pub fn from_value(value: impl Into<String>) -> Self {
        Self {
            subcomponents: vec![value.into()],
        }
    }

    /// Returns the subcomponent at `index`, or `""` when out of range.
    ///
    /// # Example
    ///
    /// ```
    /// use hl7quill::document::node::Component;
    ///
    /// let component = Component::new(vec!["a".to_string(), "b".to_string()]);
    /// assert_eq!(component.subcomponent(1), "b");
    /// assert_eq!(component.subcomponent(5), "");
    /// ```
    pub fn subcomponent(&self, index: usize) -> &str {
        self.subcomponents
            .get(index)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn subcomponents(&self) -> &[Subcomponent] {
        &self.subcomponents
    }

    pub fn len(&self) -> usize {
        self.subcomponents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subcomponents.is_empty()
    }

    pub fn into_subcomponents(self) -> Vec<Subcomponent> {
        self.subcomponents
    }
}

impl Default for Component {
    fn default() -> Self {
        Self::from_value("")
    }
}

/// One repetition of a field: an ordered sequence of components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldItem {
    components: Vec<Component>,
}

impl FieldItem {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// Creates a field item holding a single leaf value.
    pub fn from_value(value: impl Into<String>) -> Self {
        Self::new(vec![Component::from_value(value)])
    }

    /// Returns the component at `index` (0-based).
    pub fn component(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn into_components(self) -> Vec<Component> {
        self.components
    }
}

impl Default for FieldItem {
    fn default() -> Self {
        Self::new(vec![Component::default()])
    }
}

/// A field: an ordered sequence of repetitions.
///
/// Most fields have exactly one repetition; repeating fields such as phone
/// numbers or identifiers may carry several.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Field {
    items: Vec<FieldItem>,
}

impl Field {
    pub fn new(items: Vec<FieldItem>) -> Self {
        Self { items }
    }

    /// Creates a field holding a single, unsplit leaf value.
    ///
    /// Used for the segment tag and for the `MSH` delimiter fields, whose
    /// text must never be split on delimiters.
    pub fn from_value(value: impl Into<String>) -> Self {
        Self::new(vec![FieldItem::from_value(value)])
    }

    /// Returns the repetition at `index` (0-based).
    pub fn item(&self, index: usize) -> Option<&FieldItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[FieldItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<FieldItem> {
        self.items
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::new(vec![FieldItem::default()])
    }
}

/// A segment: an ordered sequence of fields, the first being the tag.
///
/// A segment always has at least the tag field. Construct one with
/// [`Segment::new`] or `Segment::try_from(Vec<Field>)`; serde input goes
/// through the same check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Field>", into = "Vec<Field>")]
pub struct Segment {
    pub(crate) fields: Vec<Field>,
}

impl Segment {
    /// Creates a segment with only its tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            fields: vec![Field::from_value(tag)],
        }
    }

    /// Creates a segment from its fields, tag first.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::EmptySegment` if `fields` is empty.
    pub fn from_fields(fields: Vec<Field>) -> Result<Self, ParseError> {
        if fields.is_empty() {
            return Err(ParseError::EmptySegment);
        }
        Ok(Self { fields })
    }

    /// Appends a field and returns the segment.
    pub fn push_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the segment tag, read from the first subcomponent of the
    /// first component of the first repetition of field 0.
    pub fn tag(&self) -> &str {
        self.fields
            .first()
            .and_then(|field| field.item(0))
            .and_then(|item| item.component(0))
            .map(|component| component.subcomponent(0))
            .unwrap_or("")
    }

    /// Returns true for the `MSH` header segment.
    pub fn is_header(&self) -> bool {
        self.tag() == HEADER_TAG
    }

    /// Returns the field at internal `index`. Index 0 is the tag, so HL7
    /// field `n` is `field(n)`.
    ///
    /// # Example
    ///
    /// ```
    /// use hl7quill::document::parser::parse_segment;
    /// use hl7quill::config::Delimiters;
    ///
    /// let segment = parse_segment("MSH|^~\\&|APP", &Delimiters::default()).unwrap();
    /// assert_eq!(segment.field(1).unwrap().to_string(), "|");
    /// assert_eq!(segment.field(2).unwrap().to_string(), "^~\\&");
    /// assert!(segment.field(9).is_none());
    /// ```
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of fields, tag slot included. Never zero.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }
}

impl TryFrom<Vec<Field>> for Segment {
    type Error = ParseError;

    fn try_from(fields: Vec<Field>) -> Result<Self, Self::Error> {
        Self::from_fields(fields)
    }
}

impl From<Segment> for Vec<Field> {
    fn from(segment: Segment) -> Self {
        segment.fields
    }
}

/// A complete HL7 message: ordered segments and the delimiters they use.
///
/// Equality compares the delimiters too. [`parse_message`] reads them from
/// the `MSH` header, which has no room for the segment separator, so a
/// message built with a separator other than `\n` only compares equal after
/// a round-trip through [`parse_message_with`] with its own delimiters.
///
/// [`parse_message`]: crate::document::parser::parse_message
/// [`parse_message_with`]: crate::document::parser::parse_message_with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub(crate) delimiters: Delimiters,
    pub(crate) segments: Vec<Segment>,
}

impl Message {
    /// Creates a message using the standard delimiters.
    pub fn new(segments: Vec<Segment>) -> Self {
        Self::with_delimiters(segments, Delimiters::default())
    }

    pub fn with_delimiters(segments: Vec<Segment>, delimiters: Delimiters) -> Self {
        Self {
            delimiters,
            segments,
        }
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Appends a segment and returns the message.
    pub fn push_segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Returns every segment in message order.
    pub fn all_segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns every segment with the given tag, in message order.
    pub fn segments(&self, tag: &str) -> Vec<&Segment> {
        self.segments.iter().filter(|s| s.tag() == tag).collect()
    }

    /// Returns the `occurrence`-th (0-based) segment with the given tag.
    ///
    /// A missing segment is `None`, not an error.
    ///
    /// # Example
    ///
    /// ```
    /// use hl7quill::Message;
    ///
    /// let message = Message::parse("MSH|^~\\&|APP\nOBX|1\nOBX|2").unwrap();
    /// assert_eq!(message.segment("OBX", 1).unwrap().to_string(), "OBX|2");
    /// assert!(message.segment("OBX", 2).is_none());
    /// assert!(message.segment("ZZZ", 0).is_none());
    /// ```
    pub fn segment(&self, tag: &str, occurrence: usize) -> Option<&Segment> {
        self.segments
            .iter()
            .filter(|s| s.tag() == tag)
            .nth(occurrence)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_shapes() {
        assert_eq!(Component::default().subcomponents(), &["".to_string()]);
        assert_eq!(FieldItem::default().len(), 1);
        assert_eq!(Field::default().len(), 1);
        assert_eq!(Field::default().item(0), Some(&FieldItem::default()));
    }

    #[test]
    fn test_subcomponent_out_of_range_is_empty() {
        let component = Component::from_value("x");
        assert_eq!(component.subcomponent(0), "x");
        assert_eq!(component.subcomponent(1), "");
        assert_eq!(Component::new(vec![]).subcomponent(0), "");
    }

    #[test]
    fn test_segment_tag() {
        let segment = Segment::new("PID");
        assert_eq!(segment.tag(), "PID");
        assert_eq!(segment.len(), 1);
        assert!(!segment.is_header());
        assert!(Segment::new(HEADER_TAG).is_header());
    }

    #[test]
    fn test_segment_requires_tag_field() {
        assert_eq!(Segment::from_fields(vec![]), Err(ParseError::EmptySegment));
        assert!(Segment::try_from(vec![Field::from_value("PV1")]).is_ok());
    }

    #[test]
    fn test_segment_tag_with_hollow_tag_field() {
        let segment = Segment::from_fields(vec![Field::new(vec![])]).unwrap();
        assert_eq!(segment.tag(), "");
    }

    #[test]
    fn test_segment_lookup() {
        let message = Message::new(vec![
            Segment::new("MSH"),
            Segment::new("OBX").push_field(Field::from_value("1")),
            Segment::new("PID"),
            Segment::new("OBX").push_field(Field::from_value("2")),
        ]);

        assert_eq!(message.len(), 4);
        assert_eq!(message.segments("OBX").len(), 2);
        assert_eq!(message.segment("PID", 0), Some(&Segment::new("PID")));
        assert_eq!(
            message.segment("OBX", 1).and_then(|s| s.field(1)),
            Some(&Field::from_value("2"))
        );
        assert!(message.segment("PID", 1).is_none());
        assert!(message.segments("ZZZ").is_empty());
    }

    #[test]
    fn test_push_segment() {
        let message = Message::new(vec![]).push_segment(Segment::new("MSH"));
        assert!(!message.is_empty());
        assert_eq!(message.all_segments()[0].tag(), "MSH");
    }
}
