//! Per-conversion state shared by the mappers
//!
//! A context is created fresh for every conversion and discarded afterwards.
//! It pins one terminology snapshot so every lookup within the conversion
//! observes the same catalog version, even across a concurrent reload.

use hl7fhir_diagnostics::FieldWarning;
use hl7fhir_terminology::TerminologyTables;
use std::sync::Arc;

pub struct ConvertContext {
    /// Terminology snapshot taken once at conversion start
    pub tables: Arc<TerminologyTables>,
    /// Conversion identifier shared by every emitted resource
    pub conversion_id: String,
    warnings: Vec<FieldWarning>,
}

impl ConvertContext {
    pub fn new(tables: Arc<TerminologyTables>, conversion_id: impl Into<String>) -> Self {
        Self {
            tables,
            conversion_id: conversion_id.into(),
            warnings: Vec::new(),
        }
    }

    /// Record a non-fatal field warning; mapping continues with a fallback
    pub fn warn(&mut self, warning: FieldWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[FieldWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<FieldWarning> {
        self.warnings
    }
}
