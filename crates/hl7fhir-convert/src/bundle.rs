//! Transaction bundle assembly
//!
//! Filters out skipped mappers, assigns conversion-scoped identities, wires
//! cross-references and emits a transaction Bundle. Entry order is part of
//! the contract: Patient first, then Encounter, then mapper-registration
//! order, because downstream servers may apply entries in list order.

use crate::fhir::{Bundle, BundleEntry, BundleRequest, Reference, Resource};
use crate::mappers::Outcome;
use std::collections::HashMap;

fn short_id(conversion_id: &str) -> &str {
    conversion_id.get(..8).unwrap_or(conversion_id)
}

fn ordering_rank(resource: &Resource) -> u8 {
    match resource {
        Resource::Patient(_) => 0,
        Resource::Encounter(_) => 1,
        _ => 2,
    }
}

/// Assemble mapped resources into a transaction bundle
pub fn assemble(outcomes: Vec<Outcome>, conversion_id: &str) -> Bundle {
    let mut resources: Vec<Resource> = outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            Outcome::Mapped(resources) => Some(resources),
            Outcome::Skip => None,
        })
        .flatten()
        .collect();

    // Stable sort keeps mapper-registration order within the tail
    resources.sort_by_key(ordering_rank);

    // Deterministic, conversion-scoped identities; repeated types get a
    // positional suffix so every id stays unique within the bundle
    let short = short_id(conversion_id);
    let mut per_type: HashMap<&'static str, usize> = HashMap::new();
    let mut first_ids: HashMap<&'static str, String> = HashMap::new();
    for resource in &mut resources {
        let type_ = resource.resource_type();
        let occurrence = per_type.entry(type_).or_insert(0);
        *occurrence += 1;
        let id = if *occurrence == 1 {
            format!("{}-{short}", type_.to_lowercase())
        } else {
            format!("{}-{short}-{occurrence}", type_.to_lowercase())
        };
        first_ids.entry(type_).or_insert_with(|| id.clone());
        resource.set_id(id);
    }

    wire_references(&mut resources, &first_ids);

    let mut bundle = Bundle::transaction(conversion_id);
    bundle.entry = resources
        .into_iter()
        .map(|resource| {
            let type_ = resource.resource_type();
            let id = resource.id().unwrap_or_default().to_string();
            BundleEntry {
                full_url: format!("{type_}/{id}"),
                resource,
                request: BundleRequest {
                    method: "POST".to_string(),
                    url: type_.to_string(),
                },
            }
        })
        .collect();
    bundle
}

/// Wire cross-references; a reference to a skipped resource is omitted from
/// the dependent resource rather than left dangling
fn wire_references(resources: &mut [Resource], first_ids: &HashMap<&'static str, String>) {
    let reference_to = |type_: &str| {
        first_ids
            .get(type_)
            .map(|id| Reference::local(type_, id))
    };
    let patient = reference_to("Patient");
    let encounter = reference_to("Encounter");
    let organization = reference_to("Organization");

    for resource in resources {
        match resource {
            Resource::Patient(patient_resource) => {
                patient_resource.managing_organization = organization.clone();
            }
            Resource::Encounter(encounter_resource) => {
                encounter_resource.subject = patient.clone();
                encounter_resource.service_provider = organization.clone();
            }
            Resource::Coverage(coverage) => {
                coverage.beneficiary = patient.clone();
            }
            Resource::RelatedPerson(related) => {
                related.patient = patient.clone();
            }
            Resource::Provenance(provenance) => {
                // A movement documents the encounter when there is one,
                // otherwise the patient record itself
                if let Some(target) = encounter.clone().or_else(|| patient.clone()) {
                    provenance.target = vec![target];
                }
            }
            Resource::Practitioner(_) | Resource::Organization(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhir::{Coverage, Encounter, Organization, Patient, Practitioner, Provenance};
    use pretty_assertions::assert_eq;

    const CONVERSION_ID: &str = "11112222-3333-4444-5555-666677778888";

    fn types(bundle: &Bundle) -> Vec<&'static str> {
        bundle.entry.iter().map(|e| e.resource.resource_type()).collect()
    }

    #[test]
    fn test_ordering_patient_then_encounter_then_registration_order() {
        let outcomes = vec![
            Outcome::single(Resource::Provenance(Provenance::new())),
            Outcome::single(Resource::Coverage(Coverage::new())),
            Outcome::single(Resource::Encounter(Encounter::new())),
            Outcome::single(Resource::Patient(Patient::new())),
        ];
        let bundle = assemble(outcomes, CONVERSION_ID);
        assert_eq!(
            types(&bundle),
            vec!["Patient", "Encounter", "Provenance", "Coverage"]
        );
    }

    #[test]
    fn test_conversion_scoped_ids() {
        let outcomes = vec![
            Outcome::single(Resource::Patient(Patient::new())),
            Outcome::Mapped(vec![
                Resource::Practitioner(Practitioner::new()),
                Resource::Practitioner(Practitioner::new()),
            ]),
        ];
        let bundle = assemble(outcomes, CONVERSION_ID);
        assert_eq!(bundle.entry[0].resource.id(), Some("patient-11112222"));
        assert_eq!(bundle.entry[1].resource.id(), Some("practitioner-11112222"));
        assert_eq!(bundle.entry[2].resource.id(), Some("practitioner-11112222-2"));
    }

    #[test]
    fn test_references_wired() {
        let outcomes = vec![
            Outcome::single(Resource::Patient(Patient::new())),
            Outcome::single(Resource::Encounter(Encounter::new())),
            Outcome::single(Resource::Organization(Organization::new())),
            Outcome::single(Resource::Coverage(Coverage::new())),
            Outcome::single(Resource::Provenance(Provenance::new())),
        ];
        let bundle = assemble(outcomes, CONVERSION_ID);

        let Resource::Encounter(encounter) = &bundle.entry[1].resource else {
            panic!("expected encounter second");
        };
        assert_eq!(
            encounter.subject.as_ref().unwrap().reference.as_deref(),
            Some("Patient/patient-11112222")
        );

        let Resource::Provenance(provenance) = bundle
            .entry
            .iter()
            .map(|e| &e.resource)
            .find(|r| r.resource_type() == "Provenance")
            .unwrap()
        else {
            panic!("expected a provenance entry");
        };
        assert_eq!(
            provenance.target[0].reference.as_deref(),
            Some("Encounter/encounter-11112222")
        );
    }

    #[test]
    fn test_skipped_references_omitted() {
        // No Patient, no Organization: dependent references must be absent
        let outcomes = vec![
            Outcome::Skip,
            Outcome::single(Resource::Encounter(Encounter::new())),
            Outcome::single(Resource::Provenance(Provenance::new())),
        ];
        let bundle = assemble(outcomes, CONVERSION_ID);

        let Resource::Encounter(encounter) = &bundle.entry[0].resource else {
            panic!("expected encounter first");
        };
        assert_eq!(encounter.subject, None);
        assert_eq!(encounter.service_provider, None);

        let Resource::Provenance(provenance) = &bundle.entry[1].resource else {
            panic!("expected provenance second");
        };
        assert_eq!(
            provenance.target[0].reference.as_deref(),
            Some("Encounter/encounter-11112222")
        );
    }

    #[test]
    fn test_transaction_requests() {
        let outcomes = vec![Outcome::single(Resource::Patient(Patient::new()))];
        let bundle = assemble(outcomes, CONVERSION_ID);
        assert_eq!(bundle.type_, "transaction");
        assert_eq!(bundle.entry[0].request.method, "POST");
        assert_eq!(bundle.entry[0].request.url, "Patient");
        assert_eq!(bundle.entry[0].full_url, "Patient/patient-11112222");
    }
}
