//! Organization mapper (MSH-4 sending facility)

use crate::context::ConvertContext;
use crate::fhir::{Identifier, Organization, Resource};
use crate::mappers::{Outcome, ResourceMapper};
use hl7fhir_diagnostics::Result;
use hl7fhir_message::ParsedMessage;

/// The sending facility (MSH-4, an HD: namespace ^ universal id ^ type)
/// becomes the Organization the Patient and Encounter point back to.
pub struct OrganizationMapper;

impl ResourceMapper for OrganizationMapper {
    fn resource_type(&self) -> &'static str {
        "Organization"
    }

    fn map(&self, msg: &ParsedMessage, ctx: &mut ConvertContext) -> Result<Outcome> {
        let Some(msh) = msg.segment("MSH") else {
            return Ok(Outcome::Skip);
        };
        let Some(facility) = msh.field(4).and_then(|f| f.first()) else {
            return Ok(Outcome::Skip);
        };

        let name = facility.component_value(1);
        if name.is_empty() {
            return Ok(Outcome::Skip);
        }

        let mut organization = Organization::new();
        organization.name = Some(name.to_string());

        // Universal id is a FINESS number in French feeds
        let universal_id = facility.component_value(2);
        if !universal_id.is_empty() {
            organization.identifier.push(Identifier {
                system: Some(ctx.tables.system("FINESS")),
                value: Some(universal_id.to_string()),
                ..Default::default()
            });
        }

        Ok(Outcome::single(Resource::Organization(organization)))
    }
}
