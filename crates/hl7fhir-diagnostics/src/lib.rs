//! Diagnostics and error handling for the HL7 v2 to FHIR conversion stack
//!
//! This crate provides the error handling infrastructure shared by the
//! tokenizer, the terminology catalog and the resource mappers: error codes,
//! the conversion error taxonomy and field-level warnings.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;
