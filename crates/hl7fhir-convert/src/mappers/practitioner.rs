//! Practitioner mapper (ROL), one resource per segment occurrence

use crate::context::ConvertContext;
use crate::fhir::{
    CodeableConcept, Coding, HumanName, Identifier, Practitioner, PractitionerQualification,
    Resource,
};
use crate::mappers::{Outcome, ResourceMapper};
use hl7fhir_diagnostics::{FieldWarning, H2F0102, Result};
use hl7fhir_message::{ParsedMessage, Segment};

pub struct PractitionerMapper;

impl ResourceMapper for PractitionerMapper {
    fn resource_type(&self) -> &'static str {
        "Practitioner"
    }

    fn map(&self, msg: &ParsedMessage, ctx: &mut ConvertContext) -> Result<Outcome> {
        let segments = msg.segments_named("ROL");
        if segments.is_empty() {
            return Ok(Outcome::Skip);
        }

        let resources = segments
            .into_iter()
            .map(|rol| Resource::Practitioner(practitioner(rol, ctx)))
            .collect();
        Ok(Outcome::Mapped(resources))
    }
}

fn practitioner(rol: &Segment, ctx: &mut ConvertContext) -> Practitioner {
    let mut practitioner = Practitioner::new();

    // ROL-3 role code resolved through the profession table
    let role_code = rol.field_value(3);
    if !role_code.is_empty() {
        if ctx.tables.known_profession(role_code).is_none() {
            ctx.warn(FieldWarning::new(
                H2F0102,
                "ROL",
                3,
                format!("unresolved role code '{role_code}', passed through"),
            ));
        }
        let concept = ctx.tables.profession(role_code);
        practitioner.qualification.push(PractitionerQualification {
            code: CodeableConcept::from_coding(Coding::new(
                ctx.tables.system("PROFESSION"),
                concept.code,
                concept.display,
            )),
        });
    }

    // ROL-4 is an XCN: id ^ family ^ given ^ middle ^ suffix ^ prefix,
    // with the assigning authority in component 9
    if let Some(person) = rol.field(4).and_then(|f| f.first()) {
        let id_value = person.component_value(1);
        if !id_value.is_empty() {
            let authority = person.component(9);
            let oid = authority
                .and_then(|c| c.subcomponent(2))
                .filter(|oid| !oid.is_empty())
                .map(|oid| format!("urn:oid:{oid}"))
                .or_else(|| {
                    authority
                        .and_then(|c| c.subcomponent(1))
                        .and_then(|name| ctx.tables.known_oid(name))
                        .map(|oid| format!("urn:oid:{oid}"))
                });
            practitioner.identifier.push(Identifier {
                system: oid,
                value: Some(id_value.to_string()),
                ..Default::default()
            });
        }

        let family = person.component_value(2);
        if !family.is_empty() {
            let mut name = HumanName {
                use_: Some("official".to_string()),
                family: Some(family.to_string()),
                ..Default::default()
            };
            let given = person.component_value(3);
            if !given.is_empty() {
                name.given.push(given.to_string());
            }
            let prefix = person.component_value(6);
            if !prefix.is_empty() {
                name.prefix.push(prefix.to_string());
            }
            practitioner.name.push(name);
        }
    }

    practitioner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::testutil::{ctx, parse};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_one_practitioner_per_rol() {
        let msg = parse(
            "MSH|^~\\&|APP\r\
             ROL|1|AD|AT|10002559^MARTIN^PAUL^^^DR^^^RPPS&1.2.250.1.71.4.2.1&ISO\r\
             ROL|2|AD|RP|10003417^DURAND^SOPHIE",
        );
        let mut ctx = ctx();
        let Outcome::Mapped(resources) = PractitionerMapper.map(&msg, &mut ctx).unwrap() else {
            panic!("expected mapped practitioners");
        };
        assert_eq!(resources.len(), 2);

        let Resource::Practitioner(first) = &resources[0] else {
            panic!("expected a Practitioner resource");
        };
        assert_eq!(first.name[0].family.as_deref(), Some("MARTIN"));
        assert_eq!(first.name[0].prefix, vec!["DR"]);
        assert_eq!(
            first.identifier[0].system.as_deref(),
            Some("urn:oid:1.2.250.1.71.4.2.1")
        );
        assert_eq!(
            first.qualification[0].code.coding[0].display.as_deref(),
            Some("Médecin responsable")
        );
    }

    #[test]
    fn test_unresolved_role_code_passes_through_with_warning() {
        let msg = parse("MSH|^~\\&|APP\rROL|1|AD|ZZ|1^X");
        let mut ctx = ctx();
        let Outcome::Mapped(resources) = PractitionerMapper.map(&msg, &mut ctx).unwrap() else {
            panic!("expected mapped practitioners");
        };
        let Resource::Practitioner(p) = &resources[0] else {
            panic!("expected a Practitioner resource");
        };
        assert_eq!(p.qualification[0].code.coding[0].code.as_deref(), Some("ZZ"));
        assert_eq!(ctx.warnings().len(), 1);
    }

    #[test]
    fn test_skip_without_rol() {
        let msg = parse("MSH|^~\\&|APP\rPID|1");
        let mut ctx = ctx();
        assert_eq!(
            PractitionerMapper.map(&msg, &mut ctx).unwrap(),
            Outcome::Skip
        );
    }
}
