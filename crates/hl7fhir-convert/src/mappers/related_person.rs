//! RelatedPerson mapper (NK1), one resource per segment occurrence

use crate::context::ConvertContext;
use crate::extract;
use crate::fhir::{CodeableConcept, Coding, RelatedPerson, Resource};
use crate::mappers::{Outcome, ResourceMapper};
use hl7fhir_diagnostics::Result;
use hl7fhir_message::{ParsedMessage, Segment};

pub struct RelatedPersonMapper;

impl ResourceMapper for RelatedPersonMapper {
    fn resource_type(&self) -> &'static str {
        "RelatedPerson"
    }

    fn map(&self, msg: &ParsedMessage, ctx: &mut ConvertContext) -> Result<Outcome> {
        let segments = msg.segments_named("NK1");
        if segments.is_empty() {
            return Ok(Outcome::Skip);
        }

        let resources = segments
            .into_iter()
            .map(|nk1| Resource::RelatedPerson(related_person(nk1, ctx)))
            .collect();
        Ok(Outcome::Mapped(resources))
    }
}

fn related_person(nk1: &Segment, ctx: &mut ConvertContext) -> RelatedPerson {
    let mut person = RelatedPerson::new();

    if let Some(field) = nk1.field(2) {
        person.name = extract::names(field);
    }

    // NK1-3 relationship: code ^ text
    if let Some(rel) = nk1.field(3).and_then(|f| f.first()) {
        let code = rel.component_value(1);
        if !code.is_empty() {
            let text = rel.component_value(2);
            let display = if text.is_empty() { code } else { text };
            person.relationship.push(CodeableConcept::from_coding(Coding::new(
                ctx.tables.system("ROLE-CODE"),
                code,
                display,
            )));
        }
    }

    if let Some(field) = nk1.field(4) {
        person.address = extract::addresses(field);
    }
    if let Some(field) = nk1.field(5) {
        person.telecom = extract::telecoms(field);
    }

    person
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::testutil::{ctx, parse};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_related_person_fields() {
        let msg = parse(
            "MSH|^~\\&|APP\rNK1|1|SECLET^PIERRE^^^^^L|SPO^Conjoint|3 RUE DU BAC^^LYON^^69001^FRA|0711223344^PRN",
        );
        let mut ctx = ctx();
        let Outcome::Mapped(resources) = RelatedPersonMapper.map(&msg, &mut ctx).unwrap() else {
            panic!("expected a mapped related person");
        };
        let Resource::RelatedPerson(person) = &resources[0] else {
            panic!("expected a RelatedPerson resource");
        };
        assert_eq!(person.name[0].family.as_deref(), Some("SECLET"));
        assert_eq!(person.relationship[0].coding[0].code.as_deref(), Some("SPO"));
        assert_eq!(person.relationship[0].text.as_deref(), Some("Conjoint"));
        assert_eq!(person.address[0].city.as_deref(), Some("LYON"));
        assert_eq!(person.telecom[0].use_.as_deref(), Some("home"));
    }

    #[test]
    fn test_one_resource_per_nk1() {
        let msg = parse("MSH|^~\\&|APP\rNK1|1|A^B|SPO\rNK1|2|C^D|CHD");
        let mut ctx = ctx();
        let Outcome::Mapped(resources) = RelatedPersonMapper.map(&msg, &mut ctx).unwrap() else {
            panic!("expected mapped related persons");
        };
        assert_eq!(resources.len(), 2);
    }

    #[test]
    fn test_skip_without_nk1() {
        let msg = parse("MSH|^~\\&|APP\rPID|1");
        let mut ctx = ctx();
        assert_eq!(
            RelatedPersonMapper.map(&msg, &mut ctx).unwrap(),
            Outcome::Skip
        );
    }
}
