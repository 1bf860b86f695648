//! Domain error types
//!
//! This module defines the error hierarchy for Aegis. Each pipeline stage owns
//! its own error enum so callers can tell where a request was rejected, and the
//! top-level [`AegisError`] wraps them all. None of these types expose
//! third-party error types.

use super::violation::Violation;
use thiserror::Error;

/// Main Aegis error type
///
/// This is the primary error type used throughout the application.
/// Stage errors convert into it with the `?` operator.
#[derive(Debug, Error)]
pub enum AegisError {
    /// Vendor adapter stage errors
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// UDM normalization stage errors
    #[error("Normalization error: {0}")]
    Normalization(#[from] NormalizationError),

    /// Forecast resource builder errors
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Profile conformance errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl AegisError {
    /// Name of the pipeline stage that produced the error
    pub fn stage(&self) -> &'static str {
        match self {
            AegisError::Adapter(_) => "adapter",
            AegisError::Normalization(_) => "normalization",
            AegisError::Build(BuildError::Validation(_)) | AegisError::Validation(_) => {
                "validation"
            }
            AegisError::Build(_) => "build",
            AegisError::Configuration(_) => "configuration",
            AegisError::Serialization(_) => "serialization",
            AegisError::Io(_) => "io",
        }
    }
}

/// Vendor adapter errors
///
/// Raised while turning a raw vendor payload into an attribute bag.
/// Unrecoverable for that payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    /// No adapter is registered (or enabled) for the vendor id
    #[error("Unsupported vendor '{vendor}'")]
    UnsupportedVendor { vendor: String },

    /// Required vendor fields are absent or have the wrong shape
    #[error("Malformed {vendor} payload at '{field}': {reason}")]
    MalformedPayload {
        vendor: String,
        field: String,
        reason: String,
    },
}

impl AdapterError {
    /// Creates a malformed payload error
    pub fn malformed(
        vendor: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AdapterError::MalformedPayload {
            vendor: vendor.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// UDM normalization errors
///
/// Raised while canonicalizing an attribute bag. Fixing these requires
/// corrected input or an updated policy table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationError {
    /// Vendor-local code has no mapping and no fallback is configured
    #[error("Unmappable code '{code}' (system: {system}) from vendor '{vendor}' at '{field}'")]
    UnmappableCode {
        vendor: String,
        field: String,
        system: String,
        code: String,
    },

    /// The bag carries no subject identifier
    #[error("Missing subject identifier in payload from vendor '{vendor}'")]
    MissingSubject { vendor: String },

    /// The unit cannot be converted to the canonical unit of the code
    #[error("Unit '{unit}' is not compatible with code '{code}' at '{field}'")]
    IncompatibleUnit {
        field: String,
        code: String,
        unit: String,
    },

    /// A value could not be interpreted (e.g. non-numeric measurement)
    #[error("Invalid value '{value}' at '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// A timestamp matched none of the accepted formats
    #[error("Invalid timestamp '{value}' at '{field}'")]
    InvalidTimestamp { field: String, value: String },
}

/// Forecast resource builder errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// Method code is not in the forecast-method code system
    #[error("Invalid forecast method '{code}'; expected one of: {allowed}")]
    InvalidMethod { code: String, allowed: String },

    /// A numeric input falls outside its permitted range
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Neither the record nor its elements carry a usable reference time
    #[error("UDM record for subject '{subject}' has no reference time")]
    MissingReferenceTime { subject: String },

    /// A bundle was requested with a record the forecast was not built from
    #[error("Forecast {resource} was built from record {expected}, not {found}")]
    RecordMismatch {
        resource: String,
        expected: String,
        found: String,
    },

    /// The constructed resource failed the profile self-check
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Profile conformance failure
///
/// Always carries the complete set of violations found in one pass.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} profile violation(s): {}", .violations.len(), summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// Creates a validation error from a violation list
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// Conversion from std::io::Error
impl From<std::io::Error> for AegisError {
    fn from(err: std::io::Error) -> Self {
        AegisError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for AegisError {
    fn from(err: serde_json::Error) -> Self {
        AegisError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for AegisError {
    fn from(err: toml::de::Error) -> Self {
        AegisError::Configuration(format!("TOML parse error: {err}"))
    }
}
