//! The parsed form of an HL7 path query.

use std::fmt;
use std::str::FromStr;

use super::error::QueryError;

/// Largest number accepted at any level of a path query.
///
/// Writes pad a segment up to the addressed index, so the bound also caps
/// how far a single write can grow a segment.
pub const MAX_INDEX: usize = 9999;

/// A hierarchical address into an HL7 message.
///
/// Every level below the segment is optional; `None` means "not specified"
/// and is distinct from index 0. All indices are stored 0-based. The field
/// index is relative to the first data field, so a segment is accessed at
/// `field + 1` to skip the tag slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    /// Target segment tag (e.g. `PID`).
    pub segment: String,
    /// Which occurrence of the segment to select (0 = first).
    pub segment_offset: usize,
    /// Field index, written 1-based.
    pub field: Option<usize>,
    /// Repetition index, written 0-based.
    pub field_item: Option<usize>,
    /// Component index, written 1-based.
    pub component: Option<usize>,
    /// Subcomponent index, written 1-based.
    pub sub_component: Option<usize>,
}

impl Query {
    /// Creates a query addressing the first occurrence of a whole segment.
    pub fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            segment_offset: 0,
            field: None,
            field_item: None,
            component: None,
            sub_component: None,
        }
    }

    /// Returns true if every index is at most [`MAX_INDEX`].
    ///
    /// Parsed queries always are; a `Query` built by hand may not be.
    pub fn is_within_limits(&self) -> bool {
        [
            Some(self.segment_offset),
            self.field.map(|i| i.saturating_add(1)),
            self.field_item,
            self.component.map(|i| i.saturating_add(1)),
            self.sub_component.map(|i| i.saturating_add(1)),
        ]
        .into_iter()
        .flatten()
        .all(|i| i <= MAX_INDEX)
    }
}

impl fmt::Display for Query {
    /// Writes the canonical path, e.g. `OBX(1)-5(0)-2-1`.
    ///
    /// The occurrence is omitted when it is 0, and levels below a missing
    /// level are not written.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segment)?;
        if self.segment_offset > 0 {
            write!(f, "({})", self.segment_offset)?;
        }

        let Some(field) = self.field else {
            return Ok(());
        };
        write!(f, "-{}", field.saturating_add(1))?;
        if let Some(item) = self.field_item {
            write!(f, "({})", item)?;
        }

        if let Some(component) = self.component {
            write!(f, "-{}", component.saturating_add(1))?;
            if let Some(sub_component) = self.sub_component {
                write!(f, "-{}", sub_component.saturating_add(1))?;
            }
        }
        Ok(())
    }
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        super::parse_query(s)
    }
}

impl TryFrom<&str> for Query {
    type Error = QueryError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        super::parse_query(s)
    }
}
