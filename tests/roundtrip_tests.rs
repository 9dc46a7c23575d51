//! Property tests for lossless serialization of messages and queries.
//!
//! 1. Serializing a message and parsing the text gives the same message
//! 2. Parsing serialized text and serializing again gives the same text
//! 3. Parsing the canonical text of a query gives the same query

use hl7quill::document::node::{Component, Field, FieldItem, Message, Segment};
use hl7quill::{parse_message, parse_query, Query};
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 .-]{0,5}"
}

fn component() -> impl Strategy<Value = Component> {
    prop::collection::vec(leaf(), 1..3).prop_map(Component::new)
}

fn field_item() -> impl Strategy<Value = FieldItem> {
    prop::collection::vec(component(), 1..4).prop_map(FieldItem::new)
}

fn field() -> impl Strategy<Value = Field> {
    prop::collection::vec(field_item(), 1..3).prop_map(Field::new)
}

fn tag() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9]{2}"
}

fn segment() -> impl Strategy<Value = Segment> {
    (
        tag().prop_filter("header is generated separately", |t| t.as_str() != "MSH"),
        prop::collection::vec(field(), 0..6),
    )
        .prop_map(|(tag, fields)| fields.into_iter().fold(Segment::new(tag), Segment::push_field))
}

fn header() -> impl Strategy<Value = Segment> {
    prop::collection::vec(field(), 0..6).prop_map(|fields| {
        let msh = Segment::new("MSH")
            .push_field(Field::from_value("|"))
            .push_field(Field::from_value("^~\\&"));
        fields.into_iter().fold(msh, Segment::push_field)
    })
}

fn message() -> impl Strategy<Value = Message> {
    (
        prop::option::of(header()),
        prop::collection::vec(segment(), 1..5),
    )
        .prop_map(|(header, segments)| Message::new(header.into_iter().chain(segments).collect()))
}

fn query() -> impl Strategy<Value = Query> {
    (
        tag(),
        0usize..4,
        prop::option::of((
            0usize..40,
            prop::option::of(0usize..4),
            prop::option::of((0usize..10, prop::option::of(0usize..5))),
        )),
    )
        .prop_map(|(segment, offset, rest)| {
            let mut query = Query::new(segment);
            query.segment_offset = offset;
            if let Some((field, item, component)) = rest {
                query.field = Some(field);
                query.field_item = item;
                if let Some((component, sub)) = component {
                    query.component = Some(component);
                    query.sub_component = sub;
                }
            }
            query
        })
}

proptest! {
    #[test]
    fn prop_message_survives_serialization(message in message()) {
        let text = message.to_string();
        let parsed = parse_message(&text).unwrap();
        prop_assert_eq!(&parsed, &message);
    }

    #[test]
    fn prop_text_survives_parsing(message in message()) {
        let text = message.to_string();
        let reserialized = parse_message(&text).unwrap().to_string();
        prop_assert_eq!(reserialized, text);
    }

    #[test]
    fn prop_query_text_parses_back(query in query()) {
        let text = query.to_string();
        prop_assert_eq!(parse_query(&text).unwrap(), query);
    }

    #[test]
    fn prop_set_then_query_returns_value(
        message in message(),
        field in 0usize..12,
        value in "[A-Za-z0-9]{1,6}",
    ) {
        let tag = message.all_segments()[0].tag().to_string();
        // MSH-1 and MSH-2 hold delimiters
        prop_assume!(!(tag == "MSH" && field < 2));

        let mut query = Query::new(tag);
        query.field = Some(field);
        query.component = Some(1);
        query.sub_component = Some(0);

        let updated = message.set_string(&query, &value).unwrap();
        prop_assert_eq!(updated.evaluate(&query), value);
    }
}

#[test]
fn test_header_only_message_roundtrip() {
    for text in ["MSH", "MSH|", "MSH|^~\\&", "MSH|^~\\&|||"] {
        let message = parse_message(text).unwrap();
        assert_eq!(message.to_string(), text);
    }
}

#[test]
fn test_empty_levels_roundtrip() {
    let text = "PID|~|^|&|^&~&^|";
    let message = parse_message(text).unwrap();
    assert_eq!(message.to_string(), text);
    assert_eq!(parse_message(&message.to_string()).unwrap(), message);
}
