//! Coverage mapper (IN1)

use crate::context::ConvertContext;
use crate::extract;
use crate::fhir::{CodeableConcept, Coding, Coverage, Identifier, Period, Reference, Resource};
use crate::mappers::{Outcome, ResourceMapper};
use hl7fhir_diagnostics::{FieldWarning, H2F0101, Result};
use hl7fhir_message::ParsedMessage;

/// Prioritized substring chain inferring the coverage type from the free-text
/// plan identifier. First match wins; the order is a business policy carried
/// over from French insurance feeds, not a redesign candidate.
const COVERAGE_KEYWORDS: &[(&[&str], &str)] = &[
    (&["MUTUELLE", "COMPLEMENTAIRE", "AMC"], "AMC"),
    (&["ALD", "LONGUE DUREE"], "ALD"),
    (&["ACCIDENT", "AT-MP", "ATMP"], "AT"),
];

fn infer_coverage_key(plan_text: &str) -> &'static str {
    let text = plan_text.to_uppercase();
    for (keywords, key) in COVERAGE_KEYWORDS {
        if keywords.iter().any(|k| text.contains(k)) {
            return key;
        }
    }
    // Mandatory health insurance is the default French coverage
    "AMO"
}

pub struct CoverageMapper;

impl ResourceMapper for CoverageMapper {
    fn resource_type(&self) -> &'static str {
        "Coverage"
    }

    fn map(&self, msg: &ParsedMessage, ctx: &mut ConvertContext) -> Result<Outcome> {
        let Some(in1) = msg.segment("IN1") else {
            return Ok(Outcome::Skip);
        };

        let mut coverage = Coverage::new();

        // IN1-2 plan id: code ^ text; both sides feed the heuristic
        let plan = in1.field(2).and_then(|f| f.first());
        let plan_text = plan
            .map(|p| format!("{} {}", p.component_value(1), p.component_value(2)))
            .unwrap_or_default();
        let concept = ctx.tables.coverage_type(infer_coverage_key(&plan_text));
        coverage.type_ = Some(CodeableConcept::from_coding(Coding::new(
            ctx.tables.system("COVERAGE-TYPE"),
            concept.code,
            concept.display,
        )));

        // IN1-4 insurance company name, as a display-only payor
        let company = in1.field_value(4);
        if !company.is_empty() {
            coverage.payor.push(Reference::display_only(company));
        }

        // IN1-12/IN1-13 plan effective and expiration dates
        let mut period = Period::default();
        for field_no in [12u16, 13] {
            let raw = in1.field_value(field_no as usize);
            if raw.is_empty() {
                continue;
            }
            let parsed = in1.field(field_no as usize).and_then(extract::date);
            let Some(date) = parsed else {
                ctx.warn(FieldWarning::new(
                    H2F0101,
                    "IN1",
                    field_no,
                    format!("unparseable plan date '{raw}', omitted"),
                ));
                continue;
            };
            if field_no == 12 {
                period.start = Some(date);
            } else {
                period.end = Some(date);
            }
        }
        if !period.is_empty() {
            coverage.period = Some(period);
        }

        let policy_number = in1.field_value(36);
        if !policy_number.is_empty() {
            coverage.identifier.push(Identifier {
                value: Some(policy_number.to_string()),
                ..Default::default()
            });
        }

        Ok(Outcome::single(Resource::Coverage(coverage)))
    }
}
