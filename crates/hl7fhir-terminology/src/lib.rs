//! French health terminology catalog
//!
//! This crate loads a versioned terminology document (ANS code systems, OIDs,
//! extension URIs, coverage types, professions, identifier types, encounter
//! classes and movement types) and exposes total lookups over an atomically
//! reloadable snapshot. Unknown keys degrade to a synthesized record carrying
//! the key itself, so a mapping gap never aborts a conversion.

mod catalog;
mod remote;
mod tables;

pub use catalog::Catalog;
pub use remote::{CachingValidator, CodeValidator, NoOpValidator};
pub use tables::{Concept, TerminologyTables};
