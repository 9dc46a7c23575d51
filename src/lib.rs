//! HL7Quill - an HL7 v2 message model with path queries.
//!
//! An HL7 v2 message is delimited text organised in nested levels:
//! message, segment, field, field repetition, component and subcomponent.
//! This crate parses that text into a [`Message`], lets callers read and write
//! values through short path queries such as `PID-5-1`, and serializes the
//! model back to text without losing a byte.
//!
//! # Example
//!
//! ```
//! use hl7quill::Message;
//!
//! let message = Message::parse("MSH|^~\\&|APP|FAC\rPID|1||123456^^^MRN||Doe^John").unwrap();
//! assert_eq!(message.query("PID-5-1").unwrap(), "Doe");
//! assert_eq!(message.query("PID-5-2").unwrap(), "John");
//!
//! let message = message.set("PID-5-2", "Jane").unwrap();
//! assert_eq!(
//!     message.to_string(),
//!     "MSH|^~\\&|APP|FAC\nPID|1||123456^^^MRN||Doe^Jane"
//! );
//! ```

pub mod config;
pub mod document;
pub mod query;

pub use config::Delimiters;
pub use document::error::ParseError;
pub use document::node::{Component, Field, FieldItem, Message, Segment, Subcomponent};
pub use document::parser::{parse_message, parse_message_with, parse_segment};
pub use document::serializer::{serialize_message, serialize_segment};
pub use query::{parse_query, Query, QueryError};
