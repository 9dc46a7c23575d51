//! HL7 path query string parser.

use super::ast::{Query, MAX_INDEX};
use super::error::QueryError;

/// Parser for HL7 path query strings.
pub struct Parser {
    input: String,
    position: usize,
}

impl Parser {
    /// Creates a new parser for the given query string.
    pub fn new(query: &str) -> Self {
        Self {
            input: query.to_string(),
            position: 0,
        }
    }

    /// Parses the query string into a Query.
    pub fn parse(query: &str) -> Result<Query, QueryError> {
        let mut parser = Parser::new(query);
        parser.parse_query()
    }

    fn parse_query(&mut self) -> Result<Query, QueryError> {
        self.skip_whitespace();
        let mut query = Query::new(self.parse_segment_name()?);

        if self.peek() == Some('(') {
            query.segment_offset = self.parse_index()?;
        }

        if self.eat_separator() {
            query.field = Some(self.parse_position("field")?);
            if self.peek() == Some('(') {
                query.field_item = Some(self.parse_index()?);
            }

            if self.eat_separator() {
                query.component = Some(self.parse_position("component")?);

                if self.eat_separator() {
                    query.sub_component = Some(self.parse_position("subcomponent")?);
                }
            }
        }

        self.skip_whitespace();
        if let Some(ch) = self.peek() {
            return Err(QueryError::UnexpectedToken {
                position: self.position,
                found: ch.to_string(),
                expected: "end of query".to_string(),
            });
        }

        Ok(query)
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Returns the next character and advances position.
    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.next();
            } else {
                break;
            }
        }
    }

    /// Consumes a level separator (`-` or `.`) if one comes next.
    fn eat_separator(&mut self) -> bool {
        match self.peek() {
            Some('-') | Some('.') => {
                self.next();
                true
            }
            _ => false,
        }
    }

    /// Expects a specific character and advances, or returns an error.
    fn expect(&mut self, expected: char) -> Result<(), QueryError> {
        self.skip_whitespace();
        let pos = self.position;
        match self.next() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(QueryError::UnexpectedToken {
                position: pos,
                found: ch.to_string(),
                expected: format!("'{}'", expected),
            }),
            None => Err(QueryError::UnexpectedEnd {
                expected: format!("'{}'", expected),
            }),
        }
    }

    /// Parses a segment name: three upper-case letters or digits, starting with a letter.
    fn parse_segment_name(&mut self) -> Result<String, QueryError> {
        let start = self.position;
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() {
                name.push(ch);
                self.next();
            } else {
                break;
            }
        }

        if name.is_empty() {
            return match self.peek() {
                Some(ch) => Err(QueryError::UnexpectedToken {
                    position: start,
                    found: ch.to_string(),
                    expected: "segment name".to_string(),
                }),
                None => Err(QueryError::UnexpectedEnd {
                    expected: "segment name".to_string(),
                }),
            };
        }

        let valid = name.len() == 3
            && name.starts_with(|c: char| c.is_ascii_uppercase())
            && name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if !valid {
            return Err(QueryError::InvalidSyntax {
                message: format!(
                    "Invalid segment name '{}', expected three upper-case letters or digits",
                    name
                ),
            });
        }

        Ok(name)
    }

    /// Parses a 1-based position and returns it 0-based.
    fn parse_position(&mut self, level: &str) -> Result<usize, QueryError> {
        let number = self.parse_number()?;
        if number == 0 {
            return Err(QueryError::InvalidSyntax {
                message: format!("{} numbers start at 1", level),
            });
        }
        Ok(number - 1)
    }

    /// Parses a 0-based index in parentheses: `(n)`.
    fn parse_index(&mut self) -> Result<usize, QueryError> {
        self.expect('(')?;
        self.skip_whitespace();
        let index = self.parse_number()?;
        self.expect(')')?;
        Ok(index)
    }

    /// Parses a non-negative integer no larger than `MAX_INDEX`.
    fn parse_number(&mut self) -> Result<usize, QueryError> {
        let start = self.position;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                self.next();
            } else {
                break;
            }
        }

        let digits = &self.input[start..self.position];
        if digits.is_empty() {
            return match self.peek() {
                Some(ch) => Err(QueryError::UnexpectedToken {
                    position: start,
                    found: ch.to_string(),
                    expected: "number".to_string(),
                }),
                None => Err(QueryError::UnexpectedEnd {
                    expected: "number".to_string(),
                }),
            };
        }

        match digits.parse::<usize>() {
            Ok(number) if number <= MAX_INDEX => Ok(number),
            _ => Err(QueryError::InvalidSyntax {
                message: format!("Number {} exceeds the maximum of {}", digits, MAX_INDEX),
            }),
        }
    }
}
