//! HL7 path query parser and evaluator.
//!
//! A path query addresses any level of an HL7 message, from a whole segment
//! down to a single subcomponent.
//!
//! # Supported Syntax
//!
//! ```text
//! SEG[(occurrence)][-FIELD[(repetition)][-COMPONENT[-SUBCOMPONENT]]]
//! ```
//!
//! - `SEG` - three upper-case letters or digits, starting with a letter
//! - `(occurrence)` - which occurrence of the segment, 0-based (default 0)
//! - `FIELD`, `COMPONENT`, `SUBCOMPONENT` - 1-based, as in HL7 documentation
//! - `(repetition)` - which field repetition, 0-based (default 0)
//! - `.` may be used instead of `-` between levels
//! - no number may exceed [`MAX_INDEX`] (9999)
//!
//! # Examples
//!
//! ```text
//! PID           the first PID segment
//! PID-5         PID field 5 (patient name)
//! PID-5-1       family name component
//! PID-3(1)-1    first component of the second patient identifier
//! OBX(2)-5      observation value of the third OBX
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use ast::{Query, MAX_INDEX};
pub use error::QueryError;
pub use evaluator::{Evaluator, Lookup, Node};
pub use parser::Parser;

/// Parses a path query, naming the query string in any error.
///
/// # Example
///
/// ```
/// use hl7quill::query::parse_query;
///
/// let query = parse_query("PID-5-1").unwrap();
/// assert_eq!(query.segment, "PID");
/// assert_eq!(query.field, Some(4));
/// assert_eq!(query.component, Some(0));
/// assert_eq!(query.to_string(), "PID-5-1");
///
/// let err = parse_query("PID-five").unwrap_err();
/// assert!(err.to_string().contains("PID-five"));
/// ```
pub fn parse_query(path: &str) -> Result<Query, QueryError> {
    Parser::parse(path).map_err(|source| QueryError::Malformed {
        query: path.to_string(),
        source: Box::new(source),
    })
}
