//! Query evaluation against the HL7 data model.
//!
//! Reads walk a segment in one fixed order: field, repetition, component,
//! subcomponent. The walk stops at the deepest level the query names, or
//! earlier when the addressed index does not exist. Scalar reads serialize
//! the node where the walk stopped; slice reads list its children.
//!
//! Two policies apply depending on the entry point:
//!
//! - [`Message::query`] and [`Message::query_slice`] are lenient. A missing
//!   segment or index is never an error: scalar reads return the last level
//!   that exists, slice reads return an empty list.
//! - [`Segment::query`] and [`Segment::query_slice`] are strict about the
//!   field. They report `QueryError::FieldOutOfRange` when the field does
//!   not exist and are lenient below it.
//!
//! A segment does not know which message it came from. The plain `Segment`
//! entry points use the standard delimiters; the `_with` variants take the
//! delimiters of the owning message.
//!
//! Writes go through [`Segment::set_string`], which consumes the segment and
//! returns the updated one, creating empty containers on the way down.

use std::mem;

use tracing::debug;

use super::ast::{Query, MAX_INDEX};
use super::error::QueryError;
use super::parse_query;
use crate::config::Delimiters;
use crate::document::node::{Component, Field, FieldItem, Message, Segment};
use crate::document::parser::{parse_component, parse_field, parse_field_item};

/// A node reached while walking a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node<'a> {
    Segment(&'a Segment),
    Field(&'a Field),
    FieldItem(&'a FieldItem),
    Component(&'a Component),
    Subcomponent(&'a str),
}

/// Outcome of walking a segment with a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// Every level the query names exists.
    Found(Node<'a>),
    /// An index was out of range; holds the last node that exists.
    Truncated(Node<'a>),
}

impl<'a> Lookup<'a> {
    pub fn node(&self) -> Node<'a> {
        match self {
            Lookup::Found(node) | Lookup::Truncated(node) => *node,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Evaluates queries against one segment.
pub struct Evaluator<'a> {
    segment: &'a Segment,
    delimiters: &'a Delimiters,
}

impl<'a> Evaluator<'a> {
    pub fn new(segment: &'a Segment, delimiters: &'a Delimiters) -> Self {
        Evaluator {
            segment,
            delimiters,
        }
    }

    /// Walks the segment as far as the query names.
    ///
    /// The repetition level is entered when the query names a repetition or a
    /// component; in the latter case the first repetition is used.
    pub fn resolve(&self, query: &Query) -> Lookup<'a> {
        let segment = self.segment;

        let Some(field_index) = query.field else {
            return Lookup::Found(Node::Segment(segment));
        };
        let Some(field) = segment.field(field_index.saturating_add(1)) else {
            return Lookup::Truncated(Node::Segment(segment));
        };

        if query.field_item.is_none() && query.component.is_none() {
            return Lookup::Found(Node::Field(field));
        }
        let Some(item) = field.item(query.field_item.unwrap_or(0)) else {
            return Lookup::Truncated(Node::Field(field));
        };

        let Some(component_index) = query.component else {
            return Lookup::Found(Node::FieldItem(item));
        };
        let Some(component) = item.component(component_index) else {
            return Lookup::Truncated(Node::FieldItem(item));
        };

        let Some(sub_index) = query.sub_component else {
            return Lookup::Found(Node::Component(component));
        };
        match component.subcomponents().get(sub_index) {
            Some(value) => Lookup::Found(Node::Subcomponent(value)),
            None => Lookup::Truncated(Node::Component(component)),
        }
    }

    /// Serializes the node the query resolves to, or the last level that
    /// exists when an index is out of range.
    pub fn evaluate(&self, query: &Query) -> String {
        self.encode(self.resolve(query).node())
    }

    /// Lists the children of the node the query resolves to.
    ///
    /// A subcomponent address gives a one-element list; an out of range
    /// address gives an empty list.
    pub fn evaluate_slice(&self, query: &Query) -> Vec<String> {
        match self.resolve(query) {
            Lookup::Found(node) => self.children(node),
            Lookup::Truncated(_) => Vec::new(),
        }
    }

    fn encode(&self, node: Node<'_>) -> String {
        match node {
            Node::Segment(segment) => segment.encode(self.delimiters),
            Node::Field(field) => field.encode(self.delimiters),
            Node::FieldItem(item) => item.encode(self.delimiters),
            Node::Component(component) => component.encode(self.delimiters),
            Node::Subcomponent(value) => value.to_string(),
        }
    }

    fn children(&self, node: Node<'_>) -> Vec<String> {
        match node {
            Node::Segment(segment) => segment.fields_as_strings(self.delimiters),
            Node::Field(field) => field.items_as_strings(self.delimiters),
            Node::FieldItem(item) => item.components_as_strings(self.delimiters),
            Node::Component(component) => component.subcomponents().to_vec(),
            Node::Subcomponent(value) => vec![value.to_string()],
        }
    }

    /// Fails unless the query names a field the segment has.
    fn check_field(&self, query: &Query, path: &str) -> Result<(), QueryError> {
        let Some(field_index) = query.field else {
            return Ok(());
        };
        let slot = field_index.saturating_add(1);
        if slot >= self.segment.len() {
            return Err(QueryError::FieldOutOfRange {
                segment: query.segment.clone(),
                field: slot,
                query: path.to_string(),
            });
        }
        Ok(())
    }
}

impl Message {
    /// Returns the value addressed by `path`, serialized.
    ///
    /// This lookup is lenient: a missing segment gives `""`, and an index
    /// past the end gives the serialized text of the last level that exists.
    /// Only a malformed path is an error.
    ///
    /// # Example
    ///
    /// ```
    /// use hl7quill::Message;
    ///
    /// let message = Message::parse("MSH|^~\\&|APP\nPID|1||123^^^MRN||Doe^John").unwrap();
    /// assert_eq!(message.query("PID-5").unwrap(), "Doe^John");
    /// assert_eq!(message.query("PID-5-2").unwrap(), "John");
    /// assert_eq!(message.query("PID-5-9").unwrap(), "Doe^John");
    /// assert_eq!(message.query("ZZZ-1").unwrap(), "");
    /// assert!(message.query("PID-").is_err());
    /// ```
    pub fn query(&self, path: &str) -> Result<String, QueryError> {
        let query = parse_query(path)?;
        Ok(self.evaluate(&query))
    }

    /// Returns the children of the level addressed by `path`, serialized.
    ///
    /// Lenient like [`Message::query`]: a missing segment or index gives an
    /// empty list.
    ///
    /// # Example
    ///
    /// ```
    /// use hl7quill::Message;
    ///
    /// let message = Message::parse("PID|1||123~456||Doe^John").unwrap();
    /// assert_eq!(message.query_slice("PID-3").unwrap(), vec!["123", "456"]);
    /// assert_eq!(message.query_slice("PID-5(0)").unwrap(), vec!["Doe", "John"]);
    /// assert!(message.query_slice("PID-30").unwrap().is_empty());
    /// ```
    pub fn query_slice(&self, path: &str) -> Result<Vec<String>, QueryError> {
        let query = parse_query(path)?;
        Ok(self.evaluate_slice(&query))
    }

    /// Scalar lookup with an already parsed query.
    pub fn evaluate(&self, query: &Query) -> String {
        self.segment(&query.segment, query.segment_offset)
            .map(|segment| Evaluator::new(segment, &self.delimiters).evaluate(query))
            .unwrap_or_default()
    }

    /// Slice lookup with an already parsed query.
    pub fn evaluate_slice(&self, query: &Query) -> Vec<String> {
        self.segment(&query.segment, query.segment_offset)
            .map(|segment| Evaluator::new(segment, &self.delimiters).evaluate_slice(query))
            .unwrap_or_default()
    }

    /// Sets the value addressed by `path` and returns the updated message.
    ///
    /// The addressed segment occurrence must exist; fields, repetitions,
    /// components and subcomponents below it are created as needed. The
    /// message is consumed: keep the returned value.
    ///
    /// # Errors
    ///
    /// - `QueryError::Malformed` if `path` does not parse
    /// - `QueryError::FieldNotSpecified` if `path` names no field
    /// - `QueryError::SegmentNotFound` if the segment occurrence is missing
    /// - `QueryError::IndexTooLarge` for a hand-built query past `MAX_INDEX`
    pub fn set(self, path: &str, value: &str) -> Result<Self, QueryError> {
        let query = parse_query(path)?;
        self.set_string(&query, value)
    }

    /// Sets a value with an already parsed query. See [`Message::set`].
    ///
    /// The query is checked before any segment is touched.
    pub fn set_string(mut self, query: &Query, value: &str) -> Result<Self, QueryError> {
        let field_index = writable_field(query)?;
        let position = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.tag() == query.segment)
            .nth(query.segment_offset)
            .map(|(position, _)| position)
            .ok_or_else(|| QueryError::SegmentNotFound {
                segment: query.segment.clone(),
                occurrence: query.segment_offset,
            })?;

        let segment = mem::replace(&mut self.segments[position], Segment::new(""));
        self.segments[position] = assign(segment, field_index, query, value, &self.delimiters);
        Ok(self)
    }
}

impl Segment {
    /// Returns the value addressed by `path` within this segment.
    ///
    /// The segment name and occurrence in `path` are not checked against this
    /// segment. Unlike [`Message::query`], the field must be named and must
    /// exist; levels below the field are lenient.
    ///
    /// # Errors
    ///
    /// - `QueryError::Malformed` if `path` does not parse
    /// - `QueryError::FieldNotSpecified` if `path` names no field
    /// - `QueryError::FieldOutOfRange` if the segment has no such field
    ///
    /// # Example
    ///
    /// ```
    /// use hl7quill::{Delimiters, parse_segment};
    ///
    /// let pid = parse_segment("PID|1||123456", &Delimiters::default()).unwrap();
    /// assert_eq!(pid.query("PID-3").unwrap(), "123456");
    ///
    /// let err = pid.query("PID-99").unwrap_err();
    /// assert_eq!(err.to_string(), "Segment PID does not have field 99 for query PID-99");
    /// ```
    pub fn query(&self, path: &str) -> Result<String, QueryError> {
        self.query_with(path, &Delimiters::default())
    }

    /// Like [`Segment::query`], serializing with the given delimiters.
    ///
    /// # Example
    ///
    /// ```
    /// use hl7quill::Message;
    ///
    /// let message = Message::parse("MSH#*@!%#APP\nPID#1####Doe*John").unwrap();
    /// let pid = message.segment("PID", 0).unwrap();
    /// assert_eq!(pid.query_with("PID-5", message.delimiters()).unwrap(), "Doe*John");
    /// assert_eq!(pid.query("PID-5").unwrap(), "Doe^John");
    /// ```
    pub fn query_with(&self, path: &str, delimiters: &Delimiters) -> Result<String, QueryError> {
        let query = parse_query(path)?;
        if query.field.is_none() {
            return Err(QueryError::FieldNotSpecified {
                query: path.to_string(),
            });
        }

        let evaluator = Evaluator::new(self, delimiters);
        evaluator.check_field(&query, path)?;
        Ok(evaluator.evaluate(&query))
    }

    /// Returns the children of the level addressed by `path` within this
    /// segment. With no field named, returns every field, tag first.
    ///
    /// # Errors
    ///
    /// - `QueryError::Malformed` if `path` does not parse
    /// - `QueryError::FieldOutOfRange` if the segment has no such field
    pub fn query_slice(&self, path: &str) -> Result<Vec<String>, QueryError> {
        self.query_slice_with(path, &Delimiters::default())
    }

    /// Like [`Segment::query_slice`], serializing with the given delimiters.
    pub fn query_slice_with(
        &self,
        path: &str,
        delimiters: &Delimiters,
    ) -> Result<Vec<String>, QueryError> {
        let query = parse_query(path)?;

        let evaluator = Evaluator::new(self, delimiters);
        evaluator.check_field(&query, path)?;
        Ok(evaluator.evaluate_slice(&query))
    }

    /// Parses `path` and sets the value it addresses. See [`Segment::set_string`].
    pub fn set(self, path: &str, value: &str) -> Result<Self, QueryError> {
        let query = parse_query(path)?;
        self.set_string(&query, value)
    }

    /// Places `value` at the level the query addresses and returns the
    /// updated segment.
    ///
    /// The segment grows with empty fields until the addressed field exists,
    /// and empty repetitions, components and subcomponents are created below
    /// it as needed. Everything else is kept. The value is split with the
    /// standard delimiters at the addressed level, so `Doe^John` set on a
    /// field becomes two components; a subcomponent value is stored as is.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::FieldNotSpecified` if the query names no field,
    /// or `QueryError::IndexTooLarge` if an index is beyond `MAX_INDEX`.
    ///
    /// # Example
    ///
    /// ```
    /// use hl7quill::{parse_query, Segment};
    ///
    /// let pid = Segment::new("PID");
    /// let pid = pid.set_string(&parse_query("PID-5-1-1").unwrap(), "Doe").unwrap();
    /// assert_eq!(pid.to_string(), "PID|||||Doe");
    /// assert_eq!(pid.query("PID-5-1-1").unwrap(), "Doe");
    /// ```
    pub fn set_string(self, query: &Query, value: &str) -> Result<Self, QueryError> {
        self.set_string_with(query, value, &Delimiters::default())
    }

    /// Like [`Segment::set_string`], splitting `value` with the given delimiters.
    pub fn set_string_with(
        self,
        query: &Query,
        value: &str,
        delimiters: &Delimiters,
    ) -> Result<Self, QueryError> {
        let field_index = writable_field(query)?;
        Ok(assign(self, field_index, query, value, delimiters))
    }
}

/// Returns the field index of a query that may be written.
fn writable_field(query: &Query) -> Result<usize, QueryError> {
    let Some(field_index) = query.field else {
        return Err(QueryError::FieldNotSpecified {
            query: query.to_string(),
        });
    };
    if !query.is_within_limits() {
        return Err(QueryError::IndexTooLarge {
            query: query.to_string(),
            limit: MAX_INDEX,
        });
    }
    Ok(field_index)
}

/// Writes `value` into `segment` at the address named by `query`.
///
/// The query must have passed `writable_field`.
fn assign(
    segment: Segment,
    field_index: usize,
    query: &Query,
    value: &str,
    delimiters: &Delimiters,
) -> Segment {
    let slot = field_index + 1;
    // MSH-1 and MSH-2 hold the delimiters themselves and are never split.
    let literal = segment.is_header() && slot <= 2;

    let mut fields = segment.fields;
    if fields.len() <= slot {
        fields.resize_with(slot + 1, Field::default);
    }

    let field = mem::take(&mut fields[slot]);
    fields[slot] = if literal {
        Field::from_value(value)
    } else {
        assign_field(field, query, value, delimiters)
    };

    debug!(query = %query, fields = fields.len(), "set segment value");
    Segment { fields }
}

fn assign_field(field: Field, query: &Query, value: &str, delimiters: &Delimiters) -> Field {
    if query.field_item.is_none() && query.component.is_none() {
        return parse_field(value, delimiters);
    }

    let index = query.field_item.unwrap_or(0);
    let mut items = field.into_items();
    if items.len() <= index {
        items.resize_with(index + 1, FieldItem::default);
    }

    let item = mem::take(&mut items[index]);
    items[index] = assign_field_item(item, query, value, delimiters);
    Field::new(items)
}

fn assign_field_item(
    item: FieldItem,
    query: &Query,
    value: &str,
    delimiters: &Delimiters,
) -> FieldItem {
    let Some(index) = query.component else {
        return parse_field_item(value, delimiters);
    };

    let mut components = item.into_components();
    if components.len() <= index {
        components.resize_with(index + 1, Component::default);
    }

    let component = mem::take(&mut components[index]);
    components[index] = assign_component(component, query, value, delimiters);
    FieldItem::new(components)
}

fn assign_component(
    component: Component,
    query: &Query,
    value: &str,
    delimiters: &Delimiters,
) -> Component {
    let Some(index) = query.sub_component else {
        return parse_component(value, delimiters);
    };

    let mut subcomponents = component.into_subcomponents();
    if subcomponents.len() <= index {
        subcomponents.resize_with(index + 1, String::new);
    }
    subcomponents[index] = value.to_string();
    Component::new(subcomponents)
}
