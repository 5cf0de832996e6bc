//! Conversion error codes following a structured numbering system
//!
//! Error code ranges:
//! - H2F0001-H2F0099: Tokenize errors (message structure)
//! - H2F0100-H2F0199: Mapping errors and field warnings
//! - H2F0200-H2F0299: Terminology errors
//! - H2F0300-H2F0399: System errors (I/O, configuration)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a tokenize error (0001-0099)
    pub const fn is_tokenize_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a mapping error (0100-0199)
    pub const fn is_mapping_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a terminology error (0200-0299)
    pub const fn is_terminology_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a system error (0300-0399)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H2F{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// Static error info storage
static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

use std::collections::HashMap;
use std::sync::LazyLock;

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Tokenize errors (0001-0099)
    map.insert(1, ErrorInfo::new("Missing MSH segment")
        .with_help("The first segment of an HL7 v2 message must be MSH"));
    map.insert(2, ErrorInfo::new("Empty message"));
    map.insert(3, ErrorInfo::new("Illegal segment name")
        .with_help("Segment names are 2 or 3 alphanumeric characters"));
    map.insert(4, ErrorInfo::new("Truncated MSH segment"));

    // Mapping errors and field warnings (0100-0199)
    map.insert(100, ErrorInfo::new("Missing required segment"));
    map.insert(101, ErrorInfo::new("Unparseable date/time"));
    map.insert(102, ErrorInfo::new("Unresolved terminology code"));
    map.insert(103, ErrorInfo::new("Empty mandatory field"));
    map.insert(104, ErrorInfo::new("Unrecognized coded value"));

    // Terminology errors (0200-0299)
    map.insert(200, ErrorInfo::new("Terminology document parse failed"));
    map.insert(201, ErrorInfo::new("Terminology document missing key"));
    map.insert(202, ErrorInfo::new("Remote code validation failed"));

    // System errors (0300-0399)
    map.insert(300, ErrorInfo::new("Internal error"));
    map.insert(301, ErrorInfo::new("I/O error"));

    map
});

// Convenient error code constants

// Tokenize errors
pub const H2F0001: ErrorCode = ErrorCode::new(1);
pub const H2F0002: ErrorCode = ErrorCode::new(2);
pub const H2F0003: ErrorCode = ErrorCode::new(3);
pub const H2F0004: ErrorCode = ErrorCode::new(4);

// Mapping errors and field warnings
pub const H2F0100: ErrorCode = ErrorCode::new(100);
pub const H2F0101: ErrorCode = ErrorCode::new(101);
pub const H2F0102: ErrorCode = ErrorCode::new(102);
pub const H2F0103: ErrorCode = ErrorCode::new(103);
pub const H2F0104: ErrorCode = ErrorCode::new(104);

// Terminology errors
pub const H2F0200: ErrorCode = ErrorCode::new(200);
pub const H2F0201: ErrorCode = ErrorCode::new(201);
pub const H2F0202: ErrorCode = ErrorCode::new(202);

// System errors
pub const H2F0300: ErrorCode = ErrorCode::new(300);
pub const H2F0301: ErrorCode = ErrorCode::new(301);
