//! Optional remote code-validation collaborator
//!
//! A network terminology service may confirm that a `(system, code)` pair is
//! valid. Its absence or failure must never block a conversion: on error the
//! code is assumed valid (availability over strictness).

use async_trait::async_trait;
use hl7fhir_diagnostics::TerminologyError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Validates a code against a code system, typically over the network
#[async_trait]
pub trait CodeValidator: Send + Sync {
    async fn validate(&self, system: &str, code: &str) -> Result<bool, TerminologyError>;
}

/// Validator used when no remote service is configured; accepts everything
pub struct NoOpValidator;

#[async_trait]
impl CodeValidator for NoOpValidator {
    async fn validate(&self, _system: &str, _code: &str) -> Result<bool, TerminologyError> {
        Ok(true)
    }
}

/// Caches remote validation results by `(system, code)`
pub struct CachingValidator {
    inner: Arc<dyn CodeValidator>,
    cache: RwLock<HashMap<(String, String), bool>>,
}

impl CachingValidator {
    pub fn new(inner: Arc<dyn CodeValidator>) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Validate with caching; a remote failure is downgraded to "valid"
    pub async fn validate(&self, system: &str, code: &str) -> bool {
        let key = (system.to_string(), code.to_string());
        if let Some(&cached) = self.cache.read().get(&key) {
            return cached;
        }

        let result = match self.inner.validate(system, code).await {
            Ok(valid) => valid,
            Err(err) => {
                log::warn!("remote code validation failed for {system}|{code}: {err}");
                true
            }
        };

        self.cache.write().insert(key, result);
        result
    }

    /// Number of cached validation results
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingValidator;

    #[async_trait]
    impl CodeValidator for FailingValidator {
        async fn validate(&self, _system: &str, _code: &str) -> Result<bool, TerminologyError> {
            Err(TerminologyError::Io("connection refused".to_string()))
        }
    }

    struct RejectingValidator;

    #[async_trait]
    impl CodeValidator for RejectingValidator {
        async fn validate(&self, _system: &str, code: &str) -> Result<bool, TerminologyError> {
            Ok(code != "BAD")
        }
    }

    #[tokio::test]
    async fn test_noop_accepts_everything() {
        let validator = NoOpValidator;
        assert!(validator.validate("http://loinc.org", "8480-6").await.unwrap());
    }

    #[tokio::test]
    async fn test_failure_is_assumed_valid() {
        let validator = CachingValidator::new(Arc::new(FailingValidator));
        assert!(validator.validate("http://loinc.org", "8480-6").await);
    }

    #[tokio::test]
    async fn test_results_are_cached() {
        let validator = CachingValidator::new(Arc::new(RejectingValidator));
        assert!(!validator.validate("sys", "BAD").await);
        assert!(validator.validate("sys", "GOOD").await);
        assert_eq!(validator.cached(), 2);
        // Second hit served from cache
        assert!(!validator.validate("sys", "BAD").await);
        assert_eq!(validator.cached(), 2);
    }
}
