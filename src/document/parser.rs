//! HL7 text parsing.
//!
//! This module turns delimited HL7 v2 text into the nested [`Message`] model.
//! Each level is split on its own delimiter: segments on line breaks, fields
//! on `|`, repetitions on `~`, components on `^` and subcomponents on `&`.
//!
//! The `MSH` header is special. Its field separator follows the tag directly
//! and is kept as the literal value of MSH-1; the encoding characters in
//! MSH-2 are kept unsplit as well.
//!
//! # Example
//!
//! ```
//! use hl7quill::document::parser::parse_message;
//!
//! let message = parse_message("MSH|^~\\&|APP|FAC\rPID|1||123456^^^MRN").unwrap();
//! assert_eq!(message.len(), 2);
//!
//! let pid = message.segment("PID", 0).unwrap();
//! let id = pid.field(3).unwrap().item(0).unwrap();
//! assert_eq!(id.component(0).unwrap().subcomponent(0), "123456");
//! assert_eq!(id.component(3).unwrap().subcomponent(0), "MRN");
//! ```

use std::str::FromStr;

use tracing::{debug, trace, warn};

use super::error::ParseError;
use super::node::{Component, Field, FieldItem, Message, Segment, HEADER_TAG};
use crate::config::Delimiters;

/// Parses HL7 text into a `Message`.
///
/// When the first segment is an `MSH` header declaring a valid delimiter
/// set, that set is used; otherwise the standard set applies. Segments may be
/// terminated by `\r`, `\n` or `\r\n`; blank lines are skipped.
///
/// The segment separator is never declared in the header, so the result
/// always writes `\n` between segments. To parse a message back with another
/// separator, use [`parse_message_with`] and the message's own delimiters.
///
/// # Errors
///
/// - `ParseError::EmptyMessage` if the text holds no segments
/// - `ParseError::MissingSegmentTag` if a segment starts with a field separator
/// - `ParseError::InvalidHeader` if an `MSH` tag is followed by something
///   other than the field separator
pub fn parse_message(text: &str) -> Result<Message, ParseError> {
    let delimiters = segment_lines(text, &Delimiters::default())
        .next()
        .and_then(Delimiters::from_header)
        .unwrap_or_default();

    parse_message_with(text, &delimiters)
}

/// Parses HL7 text into a `Message` using the given delimiters.
///
/// # Example
///
/// ```
/// use hl7quill::config::Delimiters;
/// use hl7quill::document::parser::parse_message_with;
///
/// let delimiters = Delimiters { segment: '\r', ..Delimiters::default() };
/// let message = parse_message_with("PID|1\nPV1|1", &delimiters).unwrap();
///
/// // Line feeds are accepted on input, the configured separator is used on output
/// assert_eq!(message.to_string(), "PID|1\rPV1|1");
/// ```
pub fn parse_message_with(text: &str, delimiters: &Delimiters) -> Result<Message, ParseError> {
    let segments = segment_lines(text, delimiters)
        .enumerate()
        .map(|(index, line)| {
            trace!(segment = index + 1, "parsing segment");
            parse_segment_at(line, delimiters, index + 1)
        })
        .collect::<Result<Vec<_>, _>>()?;

    if segments.is_empty() {
        return Err(ParseError::EmptyMessage);
    }

    debug!(segments = segments.len(), "parsed HL7 message");
    Ok(Message::with_delimiters(segments, *delimiters))
}

/// Parses the text of a single segment.
///
/// # Errors
///
/// Returns `ParseError::MissingSegmentTag` if the tag is empty, or
/// `ParseError::InvalidHeader` for a malformed `MSH` header.
pub fn parse_segment(text: &str, delimiters: &Delimiters) -> Result<Segment, ParseError> {
    parse_segment_at(text, delimiters, 1)
}

/// Parses field text into its repetitions, components and subcomponents.
pub fn parse_field(text: &str, delimiters: &Delimiters) -> Field {
    Field::new(
        text.split(delimiters.repetition)
            .map(|item| parse_field_item(item, delimiters))
            .collect(),
    )
}

/// Parses the text of one field repetition into components.
pub fn parse_field_item(text: &str, delimiters: &Delimiters) -> FieldItem {
    FieldItem::new(
        text.split(delimiters.component)
            .map(|component| parse_component(component, delimiters))
            .collect(),
    )
}

/// Parses component text into subcomponents.
pub fn parse_component(text: &str, delimiters: &Delimiters) -> Component {
    Component::new(
        text.split(delimiters.subcomponent)
            .map(str::to_string)
            .collect(),
    )
}

impl Message {
    /// Parses HL7 text. See [`parse_message`].
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parse_message(text)
    }
}

impl FromStr for Message {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_message(s)
    }
}

/// Splits text into non-blank segment lines.
fn segment_lines<'t>(
    text: &'t str,
    delimiters: &Delimiters,
) -> impl Iterator<Item = &'t str> + 't {
    let delimiters = *delimiters;
    text.split(move |c| delimiters.is_segment_terminator(c))
        .filter(|line| !line.trim().is_empty())
}

fn parse_segment_at(
    line: &str,
    delimiters: &Delimiters,
    position: usize,
) -> Result<Segment, ParseError> {
    if let Some(rest) = line.strip_prefix(HEADER_TAG) {
        match rest.chars().next() {
            None => return Ok(Segment::new(HEADER_TAG)),
            Some(ch) if ch == delimiters.field => {
                return Ok(parse_header(&rest[ch.len_utf8()..], delimiters))
            }
            Some(ch) if !ch.is_alphanumeric() => {
                return Err(ParseError::InvalidHeader {
                    message: format!(
                        "expected field separator '{}' after MSH, found '{}'",
                        delimiters.field, ch
                    ),
                })
            }
            // A longer tag that merely starts with MSH
            Some(_) => {}
        }
    }

    let mut parts = line.split(delimiters.field);
    let tag = parts.next().unwrap_or_default();
    if tag.is_empty() {
        return Err(ParseError::MissingSegmentTag { line: position });
    }

    let mut fields = vec![Field::from_value(tag)];
    fields.extend(parts.map(|text| parse_field(text, delimiters)));

    Segment::from_fields(fields)
}

/// Builds the `MSH` segment from the text after its field separator.
fn parse_header(rest: &str, delimiters: &Delimiters) -> Segment {
    let mut parts = rest.split(delimiters.field);
    let encoding = parts.next().unwrap_or_default();
    if encoding != delimiters.encoding_characters() {
        warn!(
            encoding,
            expected = %delimiters.encoding_characters(),
            "MSH-2 does not match the delimiters in use"
        );
    }

    let mut segment = Segment::new(HEADER_TAG)
        .push_field(Field::from_value(delimiters.field.to_string()))
        .push_field(Field::from_value(encoding));
    for text in parts {
        segment = segment.push_field(parse_field(text, delimiters));
    }
    segment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(segment: &Segment, field: usize, item: usize, component: usize, sub: usize) -> String {
        segment
            .field(field)
            .and_then(|f| f.item(item))
            .and_then(|i| i.component(component))
            .map(|c| c.subcomponent(sub).to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_parse_simple_segment() {
        let segment = parse_segment("PID|1||123", &Delimiters::default()).unwrap();
        assert_eq!(segment.tag(), "PID");
        assert_eq!(segment.len(), 4);
        assert_eq!(leaf(&segment, 1, 0, 0, 0), "1");
        assert_eq!(segment.field(2), Some(&Field::default()));
        assert_eq!(leaf(&segment, 3, 0, 0, 0), "123");
    }

    #[test]
    fn test_parse_nested_levels() {
        let segment = parse_segment("PID|a&b^c~d", &Delimiters::default()).unwrap();
        let field = segment.field(1).unwrap();
        assert_eq!(field.len(), 2);
        assert_eq!(field.item(0).unwrap().len(), 2);
        assert_eq!(field.item(0).unwrap().component(0).unwrap().len(), 2);
        assert_eq!(leaf(&segment, 1, 0, 0, 1), "b");
        assert_eq!(leaf(&segment, 1, 0, 1, 0), "c");
        assert_eq!(leaf(&segment, 1, 1, 0, 0), "d");
    }

    #[test]
    fn test_parse_header_keeps_separator_as_field_one() {
        let segment = parse_segment("MSH|^~\\&|APP|FAC", &Delimiters::default()).unwrap();
        assert!(segment.is_header());
        assert_eq!(segment.len(), 5);
        assert_eq!(segment.field(1), Some(&Field::from_value("|")));
        assert_eq!(segment.field(2), Some(&Field::from_value("^~\\&")));
        assert_eq!(leaf(&segment, 3, 0, 0, 0), "APP");
        assert_eq!(leaf(&segment, 4, 0, 0, 0), "FAC");
    }

    #[test]
    fn test_parse_bare_header() {
        let segment = parse_segment("MSH", &Delimiters::default()).unwrap();
        assert_eq!(segment.len(), 1);

        let segment = parse_segment("MSH|", &Delimiters::default()).unwrap();
        assert_eq!(segment.len(), 3);
        assert_eq!(segment.field(2), Some(&Field::from_value("")));
    }

    #[test]
    fn test_parse_header_with_wrong_separator() {
        let result = parse_segment("MSH#^~\\&#APP", &Delimiters::default());
        assert!(matches!(result, Err(ParseError::InvalidHeader { .. })));
    }

    #[test]
    fn test_tag_starting_with_header_prefix_is_not_a_header() {
        let segment = parse_segment("MSHA|1", &Delimiters::default()).unwrap();
        assert_eq!(segment.tag(), "MSHA");
        assert!(!segment.is_header());
    }

    #[test]
    fn test_parse_message_line_endings() {
        for text in [
            "MSH|^~\\&|A\rPID|1\rPV1|1",
            "MSH|^~\\&|A\nPID|1\nPV1|1\n",
            "MSH|^~\\&|A\r\nPID|1\r\nPV1|1\r\n",
        ] {
            let message = parse_message(text).unwrap();
            let tags: Vec<&str> = message.all_segments().iter().map(|s| s.tag()).collect();
            assert_eq!(tags, vec!["MSH", "PID", "PV1"], "input {:?}", text);
        }
    }

    #[test]
    fn test_parse_empty_message_fails() {
        assert_eq!(parse_message(""), Err(ParseError::EmptyMessage));
        assert_eq!(parse_message("\r\n \n"), Err(ParseError::EmptyMessage));
    }

    #[test]
    fn test_parse_missing_tag_fails() {
        assert_eq!(
            parse_message("MSH|^~\\&|A\n|1|2"),
            Err(ParseError::MissingSegmentTag { line: 2 })
        );
    }

    #[test]
    fn test_parse_message_detects_header_delimiters() {
        let message = parse_message("MSH#*@!%#APP\nPID#1##a*b@c").unwrap();
        assert_eq!(message.delimiters().field, '#');
        assert_eq!(message.delimiters().component, '*');

        let pid = message.segment("PID", 0).unwrap();
        let field = pid.field(3).unwrap();
        assert_eq!(field.len(), 2);
        assert_eq!(leaf(pid, 3, 0, 1, 0), "b");
        assert_eq!(leaf(pid, 3, 1, 0, 0), "c");
    }

    #[test]
    fn test_parse_message_ignores_invalid_header_delimiters() {
        let message = parse_message("MSHA|1\nPID|1").unwrap();
        let tags: Vec<&str> = message.all_segments().iter().map(|s| s.tag()).collect();
        assert_eq!(tags, vec!["MSHA", "PID"]);
        assert_eq!(message.delimiters(), &Delimiters::default());

        // A header whose declared set clashes is read with the standard set
        assert!(matches!(
            parse_message("MSH#^^\\&#APP\nPID#1"),
            Err(ParseError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_parse_message_without_header_uses_defaults() {
        let message = parse_message("PID|1").unwrap();
        assert_eq!(message.delimiters(), &Delimiters::default());
    }
}
