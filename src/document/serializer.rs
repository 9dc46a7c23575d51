//! HL7 text serialization.
//!
//! This module converts the nested model back into delimited text by joining
//! each level with its delimiter, the inverse of [`parse_message`]. The `MSH`
//! header is rebuilt as `MSH` + field separator + the remaining fields from
//! MSH-2 on, so the separator is never written twice.
//!
//! For any text this serializer produces, parsing and serializing again gives
//! back the same bytes.
//!
//! [`parse_message`]: super::parser::parse_message

use std::fmt;

use super::node::{Component, Field, FieldItem, Message, Segment};
use crate::config::Delimiters;

/// Serializes a message with its own delimiters.
///
/// # Example
///
/// ```
/// use hl7quill::document::parser::parse_message;
/// use hl7quill::document::serializer::serialize_message;
///
/// let text = "MSH|^~\\&|APP|FAC\nPID|1||123456^^^MRN||Doe^John";
/// let message = parse_message(text).unwrap();
/// assert_eq!(serialize_message(&message), text);
/// ```
pub fn serialize_message(message: &Message) -> String {
    message.encode(message.delimiters())
}

/// Serializes a single segment.
pub fn serialize_segment(segment: &Segment, delimiters: &Delimiters) -> String {
    segment.encode(delimiters)
}

fn join<T>(items: &[T], separator: char, encode: impl Fn(&T) -> String) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        out.push_str(&encode(item));
    }
    out
}

impl Component {
    pub fn encode(&self, delimiters: &Delimiters) -> String {
        join(self.subcomponents(), delimiters.subcomponent, String::clone)
    }
}

impl FieldItem {
    pub fn encode(&self, delimiters: &Delimiters) -> String {
        join(self.components(), delimiters.component, |c| {
            c.encode(delimiters)
        })
    }

    /// Returns each component serialized on its own.
    pub fn components_as_strings(&self, delimiters: &Delimiters) -> Vec<String> {
        self.components()
            .iter()
            .map(|c| c.encode(delimiters))
            .collect()
    }
}

impl Field {
    pub fn encode(&self, delimiters: &Delimiters) -> String {
        join(self.items(), delimiters.repetition, |i| i.encode(delimiters))
    }

    /// Returns each repetition serialized on its own.
    pub fn items_as_strings(&self, delimiters: &Delimiters) -> Vec<String> {
        self.items().iter().map(|i| i.encode(delimiters)).collect()
    }
}

impl Segment {
    pub fn encode(&self, delimiters: &Delimiters) -> String {
        if self.is_header() && self.len() > 1 {
            let mut out = String::from(self.tag());
            out.push(delimiters.field);
            out.push_str(&join(
                self.fields().get(2..).unwrap_or_default(),
                delimiters.field,
                |f| f.encode(delimiters),
            ));
            return out;
        }

        join(self.fields(), delimiters.field, |f| f.encode(delimiters))
    }

    /// Returns each field serialized on its own, tag first.
    pub fn fields_as_strings(&self, delimiters: &Delimiters) -> Vec<String> {
        self.fields().iter().map(|f| f.encode(delimiters)).collect()
    }
}

impl Message {
    pub fn encode(&self, delimiters: &Delimiters) -> String {
        join(&self.segments, delimiters.segment, |s| s.encode(delimiters))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode(&Delimiters::default()))
    }
}

impl fmt::Display for FieldItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode(&Delimiters::default()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode(&Delimiters::default()))
    }
}

impl fmt::Display for Segment {
    /// Writes the segment with the standard delimiters. A segment taken from
    /// a message with its own delimiters should use [`Segment::encode`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode(&Delimiters::default()))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_message(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::{parse_message, parse_segment};

    #[test]
    fn test_serialize_built_segment() {
        let segment = Segment::new("PID")
            .push_field(Field::from_value("1"))
            .push_field(Field::default())
            .push_field(Field::new(vec![
                FieldItem::from_value("a"),
                FieldItem::new(vec![
                    Component::new(vec!["b".to_string(), "c".to_string()]),
                    Component::from_value("d"),
                ]),
            ]));
        assert_eq!(segment.to_string(), "PID|1||a~b&c^d");
    }

    #[test]
    fn test_serialize_header_does_not_double_separator() {
        let text = "MSH|^~\\&|APP|FAC|||20240101";
        let segment = parse_segment(text, &Delimiters::default()).unwrap();
        assert_eq!(segment.to_string(), text);
    }

    #[test]
    fn test_serialize_header_variants() {
        assert_eq!(Segment::new("MSH").to_string(), "MSH");
        let built = Segment::new("MSH")
            .push_field(Field::from_value("|"))
            .push_field(Field::from_value("^~\\&"))
            .push_field(Field::from_value("APP"));
        assert_eq!(built.to_string(), "MSH|^~\\&|APP");
    }

    #[test]
    fn test_as_strings_helpers() {
        let segment = parse_segment("PID|1|a^b~c", &Delimiters::default()).unwrap();
        let d = Delimiters::default();
        assert_eq!(segment.fields_as_strings(&d), vec!["PID", "1", "a^b~c"]);

        let field = segment.field(2).unwrap();
        assert_eq!(field.items_as_strings(&d), vec!["a^b", "c"]);
        assert_eq!(field.item(0).unwrap().components_as_strings(&d), vec!["a", "b"]);
    }

    #[test]
    fn test_serialize_uses_message_delimiters() {
        let text = "MSH#*@!%#APP\rPID#1##a*b@c";
        let message = parse_message(text).unwrap();
        let delimiters = Delimiters {
            segment: '\r',
            ..*message.delimiters()
        };
        assert_eq!(message.encode(&delimiters), text);
        assert_eq!(message.to_string(), text.replace('\r', "\n"));
    }

    #[test]
    fn test_roundtrip_preserves_empty_levels() {
        let text = "MSH|^~\\&|||\nPID|||^^&~||\nZZ1|";
        let message = parse_message(text).unwrap();
        assert_eq!(message.to_string(), text);
        assert_eq!(parse_message(&message.to_string()).unwrap(), message);
    }
}
