//! Segment-to-resource mapping policies
//!
//! One mapper per FHIR resource type, run in registration order over the same
//! tokenized message. A mapper either produces resources or signals `Skip`
//! when its segment is absent; `Skip` is never an error. Unknown Z-segments
//! are simply not consulted by any mapper.

mod coverage;
mod encounter;
mod organization;
mod patient;
mod practitioner;
mod provenance;
mod related_person;

pub use coverage::CoverageMapper;
pub use encounter::EncounterMapper;
pub use organization::OrganizationMapper;
pub use patient::PatientMapper;
pub use practitioner::PractitionerMapper;
pub use provenance::ProvenanceMapper;
pub use related_person::RelatedPersonMapper;

use crate::context::ConvertContext;
use crate::fhir::Resource;
use hl7fhir_diagnostics::Result;
use hl7fhir_message::ParsedMessage;

/// Result of running one mapper over a message
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Resources produced; repeated segments (ROL, NK1) yield several
    Mapped(Vec<Resource>),
    /// The segment this mapper consumes is absent
    Skip,
}

impl Outcome {
    pub fn single(resource: Resource) -> Self {
        Self::Mapped(vec![resource])
    }
}

/// A policy that turns segments of a parsed message into one resource type
pub trait ResourceMapper: Send + Sync {
    /// Resource type this mapper emits
    fn resource_type(&self) -> &'static str;

    fn map(&self, msg: &ParsedMessage, ctx: &mut ConvertContext) -> Result<Outcome>;
}

/// Ordered mapper registry; registration order is the bundle tail order
#[derive(Default)]
pub struct MapperRegistry {
    mappers: Vec<Box<dyn ResourceMapper>>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every standard mapper in bundle order
    pub fn with_standard_mappers() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PatientMapper));
        registry.register(Box::new(EncounterMapper));
        registry.register(Box::new(OrganizationMapper));
        registry.register(Box::new(PractitionerMapper));
        registry.register(Box::new(RelatedPersonMapper));
        registry.register(Box::new(CoverageMapper));
        registry.register(Box::new(ProvenanceMapper));
        registry
    }

    pub fn register(&mut self, mapper: Box<dyn ResourceMapper>) {
        self.mappers.push(mapper);
    }

    pub fn mappers(&self) -> &[Box<dyn ResourceMapper>] {
        &self.mappers
    }

    /// Run every mapper in order, collecting outcomes
    pub fn map_all(&self, msg: &ParsedMessage, ctx: &mut ConvertContext) -> Result<Vec<Outcome>> {
        self.mappers.iter().map(|m| m.map(msg, ctx)).collect()
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::ConvertContext;
    use hl7fhir_message::{ParsedMessage, tokenize};
    use hl7fhir_terminology::Catalog;

    pub fn parse(raw: &str) -> ParsedMessage {
        tokenize(raw).unwrap()
    }

    pub fn ctx() -> ConvertContext {
        let catalog = Catalog::embedded().unwrap();
        ConvertContext::new(catalog.snapshot(), "11112222-3333-4444-5555-666677778888")
    }
}
