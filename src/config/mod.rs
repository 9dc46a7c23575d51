//! Delimiter configuration for HL7 messages.
//!
//! Every HL7 v2 message declares its own delimiter set in the `MSH` header.
//! This module provides the `Delimiters` structure with the standard defaults
//! (`|`, `~`, `^`, `&`, `\`), detection from a header line, and TOML
//! (de)serialization so a non-standard set can be kept in a config file.
//!
//! # Example
//!
//! ```
//! use hl7quill::config::Delimiters;
//!
//! // Standard delimiters
//! let delimiters = Delimiters::default();
//! assert_eq!(delimiters.field, '|');
//! assert_eq!(delimiters.encoding_characters(), "^~\\&");
//!
//! // Override a single delimiter, keep the rest
//! let custom = Delimiters::from_toml_str("segment = \"\\r\"").unwrap();
//! assert_eq!(custom.segment, '\r');
//! assert_eq!(custom.component, '^');
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The delimiter set used to split and join an HL7 message.
///
/// # Fields
///
/// * `segment` - Segment separator used when serializing (default: `\n`)
/// * `field` - Field separator (default: `|`)
/// * `repetition` - Field repetition separator (default: `~`)
/// * `component` - Component separator (default: `^`)
/// * `subcomponent` - Subcomponent separator (default: `&`)
/// * `escape` - Escape character, only reported in MSH-2 (default: `\`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delimiters {
    /// Segment separator used when serializing
    #[serde(default = "default_segment")]
    pub segment: char,

    /// Field separator
    #[serde(default = "default_field")]
    pub field: char,

    /// Field repetition separator
    #[serde(default = "default_repetition")]
    pub repetition: char,

    /// Component separator
    #[serde(default = "default_component")]
    pub component: char,

    /// Subcomponent separator
    #[serde(default = "default_subcomponent")]
    pub subcomponent: char,

    /// Escape character
    #[serde(default = "default_escape")]
    pub escape: char,
}

fn default_segment() -> char {
    '\n'
}

fn default_field() -> char {
    '|'
}

fn default_repetition() -> char {
    '~'
}

fn default_component() -> char {
    '^'
}

fn default_subcomponent() -> char {
    '&'
}

fn default_escape() -> char {
    '\\'
}

impl Default for Delimiters {
    /// Creates the standard HL7 delimiter set.
    ///
    /// # Example
    ///
    /// ```
    /// use hl7quill::config::Delimiters;
    ///
    /// let delimiters = Delimiters::default();
    /// assert_eq!(delimiters.segment, '\n');
    /// assert_eq!(delimiters.repetition, '~');
    /// ```
    fn default() -> Self {
        Self {
            segment: default_segment(),
            field: default_field(),
            repetition: default_repetition(),
            component: default_component(),
            subcomponent: default_subcomponent(),
            escape: default_escape(),
        }
    }
}

impl Delimiters {
    /// Returns the MSH-2 encoding characters in HL7 order:
    /// component, repetition, escape, subcomponent.
    pub fn encoding_characters(&self) -> String {
        [self.component, self.repetition, self.escape, self.subcomponent]
            .iter()
            .collect()
    }

    /// Returns true if `ch` terminates a segment on input.
    ///
    /// Carriage returns and line feeds are always accepted, whatever segment
    /// separator is configured for output.
    pub fn is_segment_terminator(&self, ch: char) -> bool {
        ch == '\r' || ch == '\n' || ch == self.segment
    }

    /// Reads the delimiter set declared by an `MSH` header line.
    ///
    /// Returns `None` if the line is not an `MSH` header, or if the declared
    /// set does not pass [`Delimiters::validate`] (for example a letter after
    /// the tag, as in `MSHA|1`). Encoding characters missing from a truncated
    /// MSH-2 keep their default value. The segment separator is not part of
    /// the header and stays at its default.
    ///
    /// # Example
    ///
    /// ```
    /// use hl7quill::config::Delimiters;
    ///
    /// let delimiters = Delimiters::from_header("MSH#*@!%#APP").unwrap();
    /// assert_eq!(delimiters.field, '#');
    /// assert_eq!(delimiters.component, '*');
    /// assert_eq!(delimiters.repetition, '@');
    /// assert_eq!(delimiters.escape, '!');
    /// assert_eq!(delimiters.subcomponent, '%');
    ///
    /// assert!(Delimiters::from_header("PID|1").is_none());
    /// ```
    pub fn from_header(line: &str) -> Option<Self> {
        let rest = line.strip_prefix("MSH")?;
        let mut chars = rest.chars();
        let field = chars.next().filter(|c| !c.is_alphanumeric())?;

        let encoding: Vec<char> = chars.take_while(|&c| c != field).collect();
        let defaults = Self::default();
        if encoding.len() < 4 {
            warn!(
                "MSH-2 declares {} encoding characters, using defaults for the rest",
                encoding.len()
            );
        }

        let delimiters = Self {
            segment: defaults.segment,
            field,
            component: encoding.first().copied().unwrap_or(defaults.component),
            repetition: encoding.get(1).copied().unwrap_or(defaults.repetition),
            escape: encoding.get(2).copied().unwrap_or(defaults.escape),
            subcomponent: encoding.get(3).copied().unwrap_or(defaults.subcomponent),
        };

        if let Err(err) = delimiters.validate() {
            warn!(%err, "ignoring delimiters declared by MSH header");
            return None;
        }
        Some(delimiters)
    }

    /// Checks that the delimiters can be told apart from each other and from data.
    pub fn validate(&self) -> Result<()> {
        let all = [
            ("segment", self.segment),
            ("field", self.field),
            ("repetition", self.repetition),
            ("component", self.component),
            ("subcomponent", self.subcomponent),
            ("escape", self.escape),
        ];

        for (i, (name, ch)) in all.iter().enumerate() {
            if ch.is_alphanumeric() {
                bail!("The {} delimiter '{}' must not be alphanumeric", name, ch);
            }
            if let Some((other, _)) = all[i + 1..].iter().find(|(_, c)| c == ch) {
                bail!(
                    "The {} and {} delimiters are both '{}'",
                    name,
                    other,
                    ch.escape_default()
                );
            }
        }

        Ok(())
    }

    /// Loads a delimiter set from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let delimiters: Self =
            toml::from_str(contents).context("Failed to parse delimiter configuration")?;
        delimiters
            .validate()
            .context("Invalid delimiter configuration")?;
        Ok(delimiters)
    }

    /// Renders the delimiter set as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize delimiter configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delimiters_are_valid() {
        assert!(Delimiters::default().validate().is_ok());
    }

    #[test]
    fn test_encoding_characters_order() {
        assert_eq!(Delimiters::default().encoding_characters(), "^~\\&");
    }

    #[test]
    fn test_from_header_standard() {
        let delimiters = Delimiters::from_header("MSH|^~\\&|APP|FAC").unwrap();
        assert_eq!(delimiters, Delimiters::default());
    }

    #[test]
    fn test_from_header_truncated_encoding() {
        let delimiters = Delimiters::from_header("MSH|^~|APP").unwrap();
        assert_eq!(delimiters.component, '^');
        assert_eq!(delimiters.repetition, '~');
        assert_eq!(delimiters.escape, '\\');
        assert_eq!(delimiters.subcomponent, '&');
    }

    #[test]
    fn test_from_header_bare_tag() {
        assert!(Delimiters::from_header("MSH").is_none());
    }

    #[test]
    fn test_from_header_rejects_letter_separator() {
        assert!(Delimiters::from_header("MSHA|1").is_none());
        assert!(Delimiters::from_header("MSH1|^~\\&").is_none());
    }

    #[test]
    fn test_from_header_rejects_clashing_set() {
        // Component and repetition separator are both '^'
        assert!(Delimiters::from_header("MSH|^^\\&|APP").is_none());
        // Alphanumeric encoding character
        assert!(Delimiters::from_header("MSH|1").is_none());
        // Unusual but consistent set is kept
        assert!(Delimiters::from_header("MSH#*@!%#APP").is_some());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let delimiters = Delimiters {
            component: '|',
            ..Delimiters::default()
        };
        let err = delimiters.validate().unwrap_err();
        assert!(err.to_string().contains("field and component"));
    }

    #[test]
    fn test_validate_rejects_alphanumeric() {
        let delimiters = Delimiters {
            field: 'x',
            ..Delimiters::default()
        };
        assert!(delimiters.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let delimiters = Delimiters {
            segment: '\r',
            ..Delimiters::default()
        };
        let text = delimiters.to_toml_string().unwrap();
        assert_eq!(Delimiters::from_toml_str(&text).unwrap(), delimiters);
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        assert_eq!(Delimiters::from_toml_str("").unwrap(), Delimiters::default());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Delimiters::from_toml_str("field = \"|\"\ncomponent = \"|\"").is_err());
        assert!(Delimiters::from_toml_str("field = [").is_err());
    }
}
