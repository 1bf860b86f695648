//! Profile violation records
//!
//! A [`Violation`] names one element of a candidate resource that does not
//! satisfy the AegisHealthForecast profile.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of profile constraint that was broken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// A required element is absent
    MissingRequired,
    /// An element or extension occurs too few or too many times
    Cardinality,
    /// A coded value is not a member of its bound code system
    Terminology,
    /// An element carries the wrong data type
    Type,
    /// A numeric value falls outside its permitted range
    Range,
    /// The document is not a RiskAssessment at all
    Structure,
}

impl ViolationKind {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingRequired => "missing-required",
            Self::Cardinality => "cardinality",
            Self::Terminology => "terminology",
            Self::Type => "type",
            Self::Range => "range",
            Self::Structure => "structure",
        }
    }
}

/// A single profile violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// FHIRPath-like location of the offending element
    pub path: String,

    /// Constraint category
    pub kind: ViolationKind,

    /// Diagnostic message
    pub message: String,
}

impl Violation {
    /// Creates a new violation
    pub fn new(path: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind.label(), self.path, self.message)
    }
}
