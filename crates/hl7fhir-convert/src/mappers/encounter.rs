//! Encounter mapper (PV1)

use crate::context::ConvertContext;
use crate::extract;
use crate::fhir::{CodeableConcept, Coding, Encounter, Identifier, Period, Resource};
use crate::mappers::{Outcome, ResourceMapper};
use hl7fhir_diagnostics::{FieldWarning, H2F0101, H2F0104, Result};
use hl7fhir_message::ParsedMessage;

pub struct EncounterMapper;

impl ResourceMapper for EncounterMapper {
    fn resource_type(&self) -> &'static str {
        "Encounter"
    }

    fn map(&self, msg: &ParsedMessage, ctx: &mut ConvertContext) -> Result<Outcome> {
        let Some(pv1) = msg.segment("PV1") else {
            return Ok(Outcome::Skip);
        };

        let mut encounter = Encounter::new();

        // PV1-2 patient class; unknown or absent codes fall back to
        // inpatient, the documented policy for French hospital feeds
        let class_code = pv1.field_value(2);
        if !class_code.is_empty() && ctx.tables.known_encounter_class(class_code).is_none() {
            ctx.warn(FieldWarning::new(
                H2F0104,
                "PV1",
                2,
                format!("unknown patient class '{class_code}', defaulting to IMP"),
            ));
        }
        let class = ctx.tables.encounter_class(class_code);
        encounter.class = Coding::new(ctx.tables.system("ACT-CODE"), class.code, class.display);

        let visit_number = pv1.field_value(19);
        if !visit_number.is_empty() {
            let concept = ctx.tables.identifier_type("NH");
            encounter.identifier.push(Identifier {
                type_: Some(CodeableConcept::from_coding(Coding::new(
                    ctx.tables.system("IDENTIFIER-TYPE"),
                    concept.code,
                    concept.display,
                ))),
                value: Some(visit_number.to_string()),
                ..Default::default()
            });
        }

        let admit_raw = pv1.field_value(44);
        if !admit_raw.is_empty() {
            match pv1.field(44).and_then(extract::datetime) {
                Some(start) => {
                    encounter.period = Some(Period {
                        start: Some(start),
                        end: None,
                    });
                }
                None => ctx.warn(FieldWarning::new(
                    H2F0101,
                    "PV1",
                    44,
                    format!("unparseable admit date '{admit_raw}', period omitted"),
                )),
            }
        }

        Ok(Outcome::single(Resource::Encounter(encounter)))
    }
}
