//! Terminology table snapshot and total lookups

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A resolved code/display pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub code: String,
    pub display: String,
}

impl Concept {
    pub fn new(code: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display: display.into(),
        }
    }

    /// Fallback record for an unknown key: the key stands in for both sides
    fn fallback(key: &str) -> Self {
        Self::new(key, key)
    }
}

/// One immutable snapshot of the terminology document
///
/// Every lookup is total. String tables (systems, OIDs, extensions) fall back
/// to the key itself; concept tables fall back to a key/key record. Callers
/// that need to distinguish a real hit use the `known_*` variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminologyTables {
    pub version: String,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
    pub systems: IndexMap<String, String>,
    pub oids: IndexMap<String, String>,
    pub extensions: IndexMap<String, String>,
    pub coverage_types: IndexMap<String, Concept>,
    pub professions: IndexMap<String, Concept>,
    pub identifiers: IndexMap<String, Concept>,
    pub encounter_class: IndexMap<String, Concept>,
    pub movement_types: IndexMap<String, Concept>,
}

impl TerminologyTables {
    /// Code system URL for a mnemonic key (e.g. `INS-NIR`)
    pub fn system(&self, key: &str) -> String {
        self.systems.get(key).cloned().unwrap_or_else(|| key.to_string())
    }

    /// OID lookup; a known key yields the OID as code with the key as display
    pub fn oid(&self, key: &str) -> Concept {
        self.oids
            .get(key)
            .map(|oid| Concept::new(oid.clone(), key))
            .unwrap_or_else(|| Concept::fallback(key))
    }

    /// OID lookup that reports misses, for warning generation
    pub fn known_oid(&self, key: &str) -> Option<&String> {
        self.oids.get(key)
    }

    /// Extension URI for a mnemonic key (e.g. `INS-STATUS`)
    pub fn extension(&self, key: &str) -> String {
        self.extensions.get(key).cloned().unwrap_or_else(|| key.to_string())
    }

    pub fn coverage_type(&self, key: &str) -> Concept {
        self.coverage_types
            .get(key)
            .cloned()
            .unwrap_or_else(|| Concept::fallback(key))
    }

    pub fn profession(&self, key: &str) -> Concept {
        self.professions
            .get(key)
            .cloned()
            .unwrap_or_else(|| Concept::fallback(key))
    }

    pub fn known_profession(&self, key: &str) -> Option<&Concept> {
        self.professions.get(key)
    }

    /// Identifier type (HL7 table 0203 extended with French INS types)
    pub fn identifier_type(&self, key: &str) -> Concept {
        self.identifiers
            .get(key)
            .cloned()
            .unwrap_or_else(|| Concept::fallback(key))
    }

    /// Encounter class for a PV1-2 patient class code
    ///
    /// Unknown or absent codes fall back to inpatient ("IMP"), the documented
    /// policy for French hospital feeds where PV1-2 is unreliable.
    pub fn encounter_class(&self, key: &str) -> Concept {
        self.encounter_class
            .get(key)
            .cloned()
            .unwrap_or_else(|| Concept::new("IMP", "Hospitalisation"))
    }

    pub fn known_encounter_class(&self, key: &str) -> Option<&Concept> {
        self.encounter_class.get(key)
    }

    /// ZBE movement type (INSERT/UPDATE/CANCEL)
    pub fn movement_type(&self, key: &str) -> Concept {
        self.movement_types
            .get(key)
            .cloned()
            .unwrap_or_else(|| Concept::fallback(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tables() -> TerminologyTables {
        crate::Catalog::embedded().unwrap().snapshot().as_ref().clone()
    }

    #[test]
    fn test_oid_lookup_is_total() {
        let t = tables();
        let miss = t.oid("NOT_A_REAL_KEY");
        assert_eq!(miss.code, "NOT_A_REAL_KEY");
        assert_eq!(miss.display, "NOT_A_REAL_KEY");

        let hit = t.oid("INS-NIR");
        assert_eq!(hit.code, "1.2.250.1.213.1.4.8");
        assert_eq!(hit.display, "INS-NIR");
    }

    #[test]
    fn test_encounter_class_default_is_inpatient() {
        let t = tables();
        assert_eq!(t.encounter_class("I").code, "IMP");
        let unknown = t.encounter_class("XX");
        assert_eq!(unknown.code, "IMP");
        assert_eq!(unknown.display, "Hospitalisation");
        assert!(t.known_encounter_class("XX").is_none());
    }

    #[test]
    fn test_string_tables_fall_back_to_key() {
        let t = tables();
        assert_eq!(t.system("INS-NIR"), "urn:oid:1.2.250.1.213.1.4.8");
        assert_eq!(t.system("CUSTOM"), "CUSTOM");
        assert_eq!(t.extension("NOPE"), "NOPE");
    }
}
