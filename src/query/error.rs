//! Error types for query parsing and evaluation.

use std::fmt;

/// Errors that can occur while parsing or evaluating an HL7 path query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Unexpected token at a specific position.
    UnexpectedToken {
        position: usize,
        found: String,
        expected: String,
    },
    /// Unexpected end of input.
    UnexpectedEnd { expected: String },
    /// Invalid syntax with description.
    InvalidSyntax { message: String },
    /// A query string failed to parse; wraps the parser error.
    Malformed {
        query: String,
        source: Box<QueryError>,
    },
    /// The query stops at the segment where a field is required.
    FieldNotSpecified { query: String },
    /// The segment has no field with the requested 1-based number.
    FieldOutOfRange {
        segment: String,
        field: usize,
        query: String,
    },
    /// The message has no such occurrence of the segment.
    SegmentNotFound { segment: String, occurrence: usize },
    /// A hand-built query addresses an index beyond `MAX_INDEX`.
    IndexTooLarge { query: String, limit: usize },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::UnexpectedToken {
                position,
                found,
                expected,
            } => write!(
                f,
                "Unexpected token '{}' at position {}, expected {}",
                found, position, expected
            ),
            QueryError::UnexpectedEnd { expected } => {
                write!(f, "Unexpected end of input, expected {}", expected)
            }
            QueryError::InvalidSyntax { message } => {
                write!(f, "Invalid query syntax: {}", message)
            }
            QueryError::Malformed { query, source } => {
                write!(f, "Malformed query '{}': {}", query, source)
            }
            QueryError::FieldNotSpecified { query } => {
                write!(f, "Field not specified for query {}", query)
            }
            QueryError::FieldOutOfRange {
                segment,
                field,
                query,
            } => write!(
                f,
                "Segment {} does not have field {} for query {}",
                segment, field, query
            ),
            QueryError::SegmentNotFound {
                segment,
                occurrence,
            } => write!(
                f,
                "Message has no occurrence {} of segment {}",
                occurrence, segment
            ),
            QueryError::IndexTooLarge { query, limit } => {
                write!(f, "Query {} has an index above {}", query, limit)
            }
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Malformed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
