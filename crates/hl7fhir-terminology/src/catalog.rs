//! Reloadable catalog over terminology table snapshots
//!
//! Readers take an `Arc` snapshot once and do every lookup against it, so a
//! concurrent reload is observed either entirely or not at all within a
//! single conversion.

use crate::tables::TerminologyTables;
use hl7fhir_diagnostics::TerminologyError;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

/// Default French (ANS) terminology document, compiled in
pub const ANS_TERMINOLOGY_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/ans-terminology.json"));

static EMBEDDED: Lazy<Result<TerminologyTables, TerminologyError>> =
    Lazy::new(|| parse_document(ANS_TERMINOLOGY_JSON));

/// Top-level keys every terminology document must carry
const REQUIRED_KEYS: &[&str] = &[
    "version",
    "lastUpdated",
    "systems",
    "oids",
    "extensions",
    "coverage_types",
    "professions",
    "identifiers",
    "encounter_class",
    "movement_types",
];

fn parse_document(json: &str) -> Result<TerminologyTables, TerminologyError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| TerminologyError::Parse(e.to_string()))?;

    for key in REQUIRED_KEYS {
        if value.get(key).is_none() {
            return Err(TerminologyError::MissingKey((*key).to_string()));
        }
    }

    serde_json::from_value(value).map_err(|e| TerminologyError::Parse(e.to_string()))
}

/// Thread-safe, reloadable terminology catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: Arc<RwLock<Arc<TerminologyTables>>>,
}

impl Catalog {
    /// Create a catalog from already-parsed tables
    pub fn new(tables: TerminologyTables) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Arc::new(tables))),
        }
    }

    /// Load the embedded default ANS document
    pub fn embedded() -> Result<Self, TerminologyError> {
        EMBEDDED.clone().map(Self::new)
    }

    /// Load from a JSON string
    pub fn from_json(json: &str) -> Result<Self, TerminologyError> {
        parse_document(json).map(Self::new)
    }

    /// Load from a JSON file on disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TerminologyError> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|e| TerminologyError::Io(e.to_string()))?;
        Self::from_json(&json)
    }

    /// Atomically replace the tables with a fresh parse of `path`
    ///
    /// In-flight snapshots keep reading the old tables; new snapshots see the
    /// new ones. A parse failure leaves the current tables untouched.
    pub fn reload_from_file(&self, path: impl AsRef<Path>) -> Result<(), TerminologyError> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|e| TerminologyError::Io(e.to_string()))?;
        let parsed = parse_document(&json)?;
        log::debug!(
            "terminology catalog reloaded: version {} ({} systems)",
            parsed.version,
            parsed.systems.len()
        );
        *self.tables.write() = Arc::new(parsed);
        Ok(())
    }

    /// Take a consistent snapshot for the duration of one conversion
    pub fn snapshot(&self) -> Arc<TerminologyTables> {
        self.tables.read().clone()
    }

    /// Version tag of the currently loaded document
    pub fn version(&self) -> String {
        self.tables.read().version.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_embedded_catalog_loads() {
        let catalog = Catalog::embedded().unwrap();
        assert_eq!(catalog.version(), "2024.2");
        assert!(!catalog.snapshot().systems.is_empty());
    }

    #[test]
    fn test_missing_key_fails_loudly() {
        let err = Catalog::from_json(r#"{"version": "1", "lastUpdated": "2024-01-01"}"#)
            .unwrap_err();
        assert!(matches!(err, TerminologyError::MissingKey(_)));
    }

    #[test]
    fn test_invalid_json_fails_loudly() {
        let err = Catalog::from_json("not json at all").unwrap_err();
        assert!(matches!(err, TerminologyError::Parse(_)));
    }

    #[test]
    fn test_missing_file_fails_loudly() {
        let err = Catalog::from_file("/nonexistent/terminology.json").unwrap_err();
        assert!(matches!(err, TerminologyError::Io(_)));
    }

    #[test]
    fn test_reload_swaps_snapshot_atomically() {
        let catalog = Catalog::embedded().unwrap();
        let before = catalog.snapshot();

        let mut updated: serde_json::Value =
            serde_json::from_str(ANS_TERMINOLOGY_JSON).unwrap();
        updated["version"] = "2025.1".into();
        updated["oids"]["INS-NIR"] = "9.9.9".into();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{updated}").unwrap();
        catalog.reload_from_file(file.path()).unwrap();

        // The pre-reload snapshot still sees the old tables for every key
        assert_eq!(before.version, "2024.2");
        assert_eq!(before.oid("INS-NIR").code, "1.2.250.1.213.1.4.8");

        // A fresh snapshot sees the new tables for every key
        let after = catalog.snapshot();
        assert_eq!(after.version, "2025.1");
        assert_eq!(after.oid("INS-NIR").code, "9.9.9");
    }

    #[test]
    fn test_failed_reload_keeps_current_tables() {
        let catalog = Catalog::embedded().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"version\": \"broken\"}}").unwrap();
        assert!(catalog.reload_from_file(file.path()).is_err());
        assert_eq!(catalog.version(), "2024.2");
    }
}
