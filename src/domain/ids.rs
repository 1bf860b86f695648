//! Domain identifier types with validation
//!
//! Newtype wrappers keep patient subject identifiers and vendor identifiers
//! from being mixed up with each other or with arbitrary strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest subject id used verbatim in FHIR ids
const MAX_VERBATIM_ID_LEN: usize = 48;

/// Patient subject identifier
///
/// The identifier the source EHR uses for the patient (MRN, patient id, PID-3).
///
/// # Examples
///
/// ```
/// use aegis::domain::ids::SubjectId;
/// use std::str::FromStr;
///
/// let subject = SubjectId::from_str("patient-123").unwrap();
/// assert_eq!(subject.as_str(), "patient-123");
/// assert_eq!(subject.reference(), "Patient/patient-123");
///
/// let mrn = SubjectId::from_str("MRN: 0042 77").unwrap();
/// assert!(mrn.fhir_id().starts_with("subject-"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a new SubjectId, trimming surrounding whitespace
    ///
    /// # Returns
    ///
    /// Returns `Ok(SubjectId)` if the ID is non-empty, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("Subject ID cannot be empty".to_string());
        }
        if trimmed.contains('/') {
            return Err(format!("Subject ID cannot contain '/': {trimmed}"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the subject ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// FHIR resource id for the patient
    ///
    /// Subjects that are already valid FHIR ids and short enough to take
    /// element suffixes (`-cond-12`) are used as is. Anything else becomes
    /// `subject-` followed by the first 32 hex digits of its SHA-256.
    pub fn fhir_id(&self) -> String {
        let verbatim = self.0.len() <= MAX_VERBATIM_ID_LEN
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        if verbatim {
            return self.0.clone();
        }
        let digest = crate::core::fingerprint::sha256_hex(self.0.as_bytes());
        format!("subject-{}", &digest[..32])
    }

    /// FHIR literal reference to the patient
    pub fn reference(&self) -> String {
        format!("Patient/{}", self.fhir_id())
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubjectId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for SubjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source vendor identifier
///
/// Vendor ids are case-insensitive; the canonical form is lowercase.
///
/// # Examples
///
/// ```
/// use aegis::domain::ids::VendorId;
///
/// let vendor = VendorId::new(" Epic ").unwrap();
/// assert_eq!(vendor.as_str(), "epic");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VendorId(String);

impl VendorId {
    /// Creates a new VendorId in canonical lowercase form
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let canonical = id.trim().to_lowercase();
        if canonical.is_empty() {
            return Err("Vendor ID cannot be empty".to_string());
        }
        if !canonical
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(format!(
                "Vendor ID may only contain letters, digits, '-' and '_': {id}"
            ));
        }
        Ok(Self(canonical))
    }

    /// Wraps a built-in vendor name that is already canonical
    pub(crate) fn from_static(id: &'static str) -> Self {
        debug_assert_eq!(id, id.to_lowercase());
        Self(id.to_string())
    }

    /// Returns the vendor ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VendorId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for VendorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
