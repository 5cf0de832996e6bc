//! HL7 v2.x message model and tokenizer
//!
//! This crate turns a raw pipe-delimited HL7 v2.x message into a positional
//! structure: segments, fields, repetitions, components and sub-components,
//! split with the delimiters the message itself declares in MSH-1/MSH-2.
//! Escape sequences are kept verbatim; mappers operate on raw component text.

mod message;
mod tokenizer;

pub use message::{Component, Delimiters, Field, ParsedMessage, Repetition, Segment};
pub use tokenizer::tokenize;
