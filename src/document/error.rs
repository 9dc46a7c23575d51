//! Error types for HL7 message deserialization.

use std::fmt;

/// Errors that can occur while turning text into a `Message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The text contains no segments.
    EmptyMessage,
    /// A segment was constructed without its tag slot.
    EmptySegment,
    /// A segment line has an empty tag (1-based line number).
    MissingSegmentTag { line: usize },
    /// The `MSH` header does not match the delimiters in effect.
    InvalidHeader { message: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyMessage => write!(f, "HL7 message contains no segments"),
            ParseError::EmptySegment => write!(f, "Segment must have at least a tag field"),
            ParseError::MissingSegmentTag { line } => {
                write!(f, "Segment on line {} has no tag", line)
            }
            ParseError::InvalidHeader { message } => {
                write!(f, "Invalid MSH header: {}", message)
            }
        }
    }
}

impl std::error::Error for ParseError {}
