//! HL7 v2.x to FHIR R4 conversion for French health feeds
//!
//! This crate converts IHE-PAM style ADT messages into FHIR R4 transaction
//! bundles, resolving codes against the French national (ANS) terminology:
//! - Tokenizing pipe-delimited HL7 v2.x messages
//! - One mapper per FHIR resource type (Patient, Encounter, Coverage, ...)
//! - Atomically reloadable terminology catalog
//! - Transaction bundle assembly with conversion-scoped ids
//!
//! # Example
//!
//! ```ignore
//! use hl7fhir::convert_message;
//!
//! let raw = "MSH|^~\\&|APP|FAC|||20240517101530||ADT^A01|42|P|2.5\r\
//!            PID|1||123||DUPONT^JEAN|||M";
//!
//! let outcome = convert_message(raw)?;
//! assert!(outcome.success);
//! ```

// Re-export all public APIs from internal crates
pub use hl7fhir_convert as convert;
pub use hl7fhir_diagnostics as diagnostics;
pub use hl7fhir_message as message;
pub use hl7fhir_terminology as terminology;

// Convenience re-exports
pub use hl7fhir_convert::{ConversionOutcome, ConvertOptions, Converter};
pub use hl7fhir_diagnostics::{ConvertError, Result};
pub use hl7fhir_message::{ParsedMessage, tokenize};
pub use hl7fhir_terminology::Catalog;

/// Convert one raw message with the embedded terminology catalog and the
/// standard mapper set
pub fn convert_message(raw: &str) -> Result<ConversionOutcome> {
    let catalog = Catalog::embedded()?;
    Ok(Converter::new().convert(raw, &catalog))
}
