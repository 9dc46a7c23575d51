//! HL7 message model and its text form.
//!
//! This module provides the nested container types of an HL7 v2 message,
//! the parser that builds them from delimited text and the serializer that
//! writes them back.

pub mod error;
pub mod node;
pub mod parser;
pub mod serializer;
