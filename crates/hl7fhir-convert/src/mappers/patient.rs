//! Patient mapper (PID, plus ZFD patient-level extensions)

use crate::context::ConvertContext;
use crate::extract;
use crate::fhir::{Extension, Patient, Resource};
use crate::mappers::{Outcome, ResourceMapper};
use hl7fhir_diagnostics::{FieldWarning, H2F0101, H2F0104, Result};
use hl7fhir_message::{ParsedMessage, Segment};

/// INS identifiers whose status sub-component marks them provisional must be
/// flagged through the identity-reliability extension, not silently trusted.
const INS_DRAFT_STATUSES: &[&str] = &["PROV", "PROVISOIRE", "UNVERIFIED", "NV"];

pub struct PatientMapper;

impl ResourceMapper for PatientMapper {
    fn resource_type(&self) -> &'static str {
        "Patient"
    }

    fn map(&self, msg: &ParsedMessage, ctx: &mut ConvertContext) -> Result<Outcome> {
        let Some(pid) = msg.segment("PID") else {
            return Ok(Outcome::Skip);
        };

        let mut patient = Patient::new();

        if let Some(field) = pid.field(5) {
            patient.name = extract::names(field);
        }

        if let Some(field) = pid.field(3) {
            patient.identifier = extract::identifiers(field, &ctx.tables);
            if let Some(status) = ins_draft_status(pid, ctx) {
                patient.extension.push(Extension {
                    url: ctx.tables.extension("INS-STATUS"),
                    value_code: Some(status),
                    ..Default::default()
                });
            }
        }

        patient.gender = Some(gender(pid, ctx));

        let birth_raw = pid.field_value(7);
        if !birth_raw.is_empty() {
            patient.birth_date = pid.field(7).and_then(extract::date);
            if patient.birth_date.is_none() {
                ctx.warn(FieldWarning::new(
                    H2F0101,
                    "PID",
                    7,
                    format!("unparseable birth date '{birth_raw}', birthDate omitted"),
                ));
            }
        }

        if let Some(field) = pid.field(11) {
            patient.address = extract::addresses(field);
        }
        if let Some(field) = pid.field(13) {
            patient.telecom = extract::telecoms(field);
        }
        if let Some(field) = pid.field(14) {
            let mut work = extract::telecoms(field);
            for point in &mut work {
                point.use_.get_or_insert_with(|| "work".to_string());
            }
            patient.telecom.extend(work);
        }

        apply_zfd(msg, ctx, &mut patient);

        Ok(Outcome::single(Resource::Patient(patient)))
    }
}

/// PID-8 through the administrative-gender terminology; unrecognized codes
/// default to `unknown` with a warning
fn gender(pid: &Segment, ctx: &mut ConvertContext) -> String {
    let code = pid.field_value(8);
    match code {
        "F" | "f" => "female",
        "M" | "m" => "male",
        "O" | "o" => "other",
        "" | "U" | "u" => "unknown",
        other => {
            let system = ctx.tables.system("ADMINISTRATIVE-GENDER");
            ctx.warn(FieldWarning::new(
                H2F0104,
                "PID",
                8,
                format!("unrecognized gender code '{other}' for {system}, defaulting to unknown"),
            ));
            "unknown"
        }
    }
    .to_string()
}

/// Scan PID-3 repetitions for an INS-typed identifier carrying a draft status
/// in the type component's second sub-component
fn ins_draft_status(pid: &Segment, ctx: &ConvertContext) -> Option<String> {
    let field = pid.field(3)?;
    for rep in &field.repetitions {
        let Some(type_component) = rep.component(5) else {
            continue;
        };
        let type_code = type_component.subcomponent(1).unwrap_or("");
        if ctx.tables.identifier_type(type_code).code != "INS" {
            continue;
        }
        let status = type_component.subcomponent(2).unwrap_or("");
        if INS_DRAFT_STATUSES.contains(&status.to_ascii_uppercase().as_str()) {
            return Some(status.to_string());
        }
    }
    None
}

/// ZFD carries insurance-verification bookkeeping mapped to patient extensions
fn apply_zfd(msg: &ParsedMessage, ctx: &mut ConvertContext, patient: &mut Patient) {
    let Some(zfd) = msg.segment("ZFD") else {
        return;
    };

    let status = zfd.field_value(1);
    if !status.is_empty() {
        patient.extension.push(Extension {
            url: ctx.tables.extension("INSURANCE-VERIFICATION"),
            value_code: Some(status.to_string()),
            ..Default::default()
        });
    }

    let date_raw = zfd.field_value(2);
    if !date_raw.is_empty() {
        match zfd.field(2).and_then(extract::date) {
            Some(date) => patient.extension.push(Extension {
                url: ctx.tables.extension("INSURANCE-VERIFICATION-DATE"),
                value_date: Some(date),
                ..Default::default()
            }),
            None => ctx.warn(FieldWarning::new(
                H2F0101,
                "ZFD",
                2,
                format!("unparseable verification date '{date_raw}', extension omitted"),
            )),
        }
    }
}
