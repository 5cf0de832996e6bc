//! HL7 v2 segment to FHIR R4 resource mapping engine
//!
//! The crate is organized the way a conversion flows: [`extract`] turns
//! composite HL7 fields into normalized FHIR datatypes, [`mappers`] hold one
//! policy per resource type, [`bundle`] assembles the transaction bundle and
//! [`convert`] orchestrates the whole pass.

pub mod bundle;
pub mod context;
pub mod extract;
pub mod fhir;
pub mod mappers;

mod convert;

pub use context::ConvertContext;
pub use convert::{ConversionOutcome, ConvertOptions, Converter};
