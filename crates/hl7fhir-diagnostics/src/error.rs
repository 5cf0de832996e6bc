//! Conversion error taxonomy and field-level warnings

use crate::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - conversion cannot proceed
    Error,
    /// Warning - a field was dropped or replaced by a fallback, conversion continues
    Warning,
    /// Information - informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A non-fatal field-level warning recorded during mapping
///
/// Warnings never abort a conversion; they are collected on the outcome so a
/// caller can distinguish "converted" from "converted with caveats".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldWarning {
    /// Warning code (0100-0199 range)
    pub code: ErrorCode,
    /// Segment the field belongs to (e.g. "PID")
    pub segment: String,
    /// 1-based field index within the segment
    pub field: u16,
    /// Human-readable message
    pub message: String,
}

impl FieldWarning {
    /// Create a new warning for a segment field
    pub fn new(
        code: ErrorCode,
        segment: impl Into<String>,
        field: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            segment: segment.into(),
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}-{}: {}",
            self.code, self.segment, self.field, self.message
        )
    }
}

/// Terminology catalog error
///
/// Raised only by `load`/`reload`; lookups on a loaded catalog are total and
/// never produce errors.
#[derive(Debug, Clone, Error)]
pub enum TerminologyError {
    /// The terminology document could not be read
    #[error("terminology I/O error: {0}")]
    Io(String),

    /// The terminology document is not valid JSON or has the wrong shape
    #[error("terminology parse error: {0}")]
    Parse(String),

    /// A mandatory top-level key is absent from the document
    #[error("terminology document missing key: {0}")]
    MissingKey(String),
}

/// Main conversion error type
///
/// Fatal errors only; field-level issues become [`FieldWarning`]s instead.
#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    /// The message has no parseable MSH or an illegal segment name
    #[error("{code}: {message}")]
    MalformedMessage { code: ErrorCode, message: String },

    /// A segment the bundle depends on is absent (e.g. no PID)
    #[error("missing required segment: {segment}")]
    MissingRequiredSegment { segment: String },

    /// Terminology load failure
    #[error(transparent)]
    Terminology(#[from] TerminologyError),

    /// Internal error
    #[error("system error: {message}")]
    System { message: String },
}

impl ConvertError {
    /// Create a malformed-message error
    pub fn malformed(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::MalformedMessage {
            code,
            message: message.into(),
        }
    }

    /// Create a missing-segment error
    pub fn missing_segment(segment: impl Into<String>) -> Self {
        Self::MissingRequiredSegment {
            segment: segment.into(),
        }
    }

    /// Create a system error
    pub fn system(message: impl Into<String>) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    /// Stable error kind string surfaced on the conversion outcome
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedMessage { .. } => "MalformedMessage",
            Self::MissingRequiredSegment { .. } => "MissingRequiredSegment",
            Self::Terminology(_) => "TerminologyLoadError",
            Self::System { .. } => "SystemError",
        }
    }
}
