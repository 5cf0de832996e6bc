//! Conversion orchestrator
//!
//! Sequences tokenizer, mappers and bundle assembler, and folds everything
//! into a single outcome object: either a complete transaction bundle (with
//! any field warnings) or a typed failure. Conversion is a pure, synchronous
//! single pass over one message; the catalog snapshot is the only shared
//! state and is pinned for the whole call.

use crate::bundle::assemble;
use crate::context::ConvertContext;
use crate::fhir::Bundle;
use crate::mappers::MapperRegistry;
use hl7fhir_diagnostics::{ConvertError, FieldWarning, Result};
use hl7fhir_message::tokenize;
use hl7fhir_terminology::Catalog;
use serde::Serialize;
use uuid::Uuid;

/// Orchestrator policy knobs
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    /// Fail the whole conversion when no PID is present. Disable for
    /// non-patient-dependent feeds to emit a partial bundle instead.
    pub require_patient: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            require_patient: true,
        }
    }
}

/// The outcome a caller receives: "did not convert" (fatal) is distinguished
/// from "converted with caveats" (warnings present, bundle non-null)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutcome {
    pub success: bool,
    pub conversion_id: String,
    pub warnings: Vec<String>,
    pub bundle: Option<Bundle>,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
}

/// HL7 v2 to FHIR converter
pub struct Converter {
    registry: MapperRegistry,
    options: ConvertOptions,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    /// Converter with the standard mappers and default options
    pub fn new() -> Self {
        Self {
            registry: MapperRegistry::with_standard_mappers(),
            options: ConvertOptions::default(),
        }
    }

    pub fn with_options(options: ConvertOptions) -> Self {
        Self {
            registry: MapperRegistry::with_standard_mappers(),
            options,
        }
    }

    /// Converter with a custom mapper registry
    pub fn with_registry(registry: MapperRegistry, options: ConvertOptions) -> Self {
        Self { registry, options }
    }

    /// Convert one raw message against the given terminology catalog
    pub fn convert(&self, raw: &str, catalog: &Catalog) -> ConversionOutcome {
        let conversion_id = Uuid::new_v4().to_string();
        match self.run(raw, catalog, &conversion_id) {
            Ok((bundle, warnings)) => {
                log::debug!(
                    "conversion {conversion_id} succeeded: {} entries, {} warnings",
                    bundle.entry.len(),
                    warnings.len()
                );
                ConversionOutcome {
                    success: true,
                    conversion_id,
                    warnings: warnings.iter().map(ToString::to_string).collect(),
                    bundle: Some(bundle),
                    error_kind: None,
                    error_message: None,
                }
            }
            Err(err) => {
                log::warn!("conversion {conversion_id} failed: {err}");
                ConversionOutcome {
                    success: false,
                    conversion_id,
                    warnings: Vec::new(),
                    bundle: None,
                    error_kind: Some(err.kind().to_string()),
                    error_message: Some(err.to_string()),
                }
            }
        }
    }

    fn run(
        &self,
        raw: &str,
        catalog: &Catalog,
        conversion_id: &str,
    ) -> Result<(Bundle, Vec<FieldWarning>)> {
        let msg = tokenize(raw)?;
        log::debug!(
            "conversion {conversion_id}: {}^{} control id '{}', {} segments",
            msg.message_type,
            msg.trigger_event,
            msg.control_id,
            msg.segments.len()
        );

        if self.options.require_patient && !msg.has_segment("PID") {
            return Err(ConvertError::missing_segment("PID"));
        }

        let mut ctx = ConvertContext::new(catalog.snapshot(), conversion_id);
        let outcomes = self.registry.map_all(&msg, &mut ctx)?;
        let bundle = assemble(outcomes, conversion_id);
        Ok((bundle, ctx.into_warnings()))
    }
}
