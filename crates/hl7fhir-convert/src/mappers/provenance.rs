//! Provenance mapper (ZBE movement bookkeeping)

use crate::context::ConvertContext;
use crate::extract;
use crate::fhir::{CodeableConcept, Coding, Provenance, ProvenanceAgent, Reference, Resource};
use crate::mappers::{Outcome, ResourceMapper};
use hl7fhir_diagnostics::{FieldWarning, H2F0101, Result};
use hl7fhir_message::ParsedMessage;

/// ZBE is the French IHE-PAM movement segment: ZBE-1 movement id, ZBE-2 the
/// movement timestamp and ZBE-4 the action (INSERT/UPDATE/CANCEL).
pub struct ProvenanceMapper;

impl ResourceMapper for ProvenanceMapper {
    fn resource_type(&self) -> &'static str {
        "Provenance"
    }

    fn map(&self, msg: &ParsedMessage, ctx: &mut ConvertContext) -> Result<Outcome> {
        let Some(zbe) = msg.segment("ZBE") else {
            return Ok(Outcome::Skip);
        };

        let mut provenance = Provenance::new();

        let event_raw = zbe.field_value(4);
        if !event_raw.is_empty() {
            let concept = ctx.tables.movement_type(event_raw);
            provenance.activity = Some(CodeableConcept {
                coding: vec![Coding::new(
                    ctx.tables.system("MOVEMENT-TYPE"),
                    concept.code,
                    concept.display,
                )],
                // Raw event text is kept verbatim alongside the resolved code
                text: Some(event_raw.to_string()),
            });
        }

        let recorded_raw = zbe.field_value(2);
        if !recorded_raw.is_empty() {
            provenance.recorded = zbe.field(2).and_then(extract::datetime);
            if provenance.recorded.is_none() {
                ctx.warn(FieldWarning::new(
                    H2F0101,
                    "ZBE",
                    2,
                    format!("unparseable movement date '{recorded_raw}', recorded omitted"),
                ));
            }
        }

        let sending_application = msg.segment("MSH").map(|msh| msh.field_value(3)).unwrap_or("");
        provenance.agent.push(ProvenanceAgent {
            who: Reference::display_only(if sending_application.is_empty() {
                "unknown"
            } else {
                sending_application
            }),
        });

        Ok(Outcome::single(Resource::Provenance(provenance)))
    }
}
