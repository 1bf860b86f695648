//! Unified Data Model
//!
//! The canonical patient snapshot the normalizer produces. Every code carries a
//! declared [`TerminologySystem`], every measured value carries its canonical
//! unit, and every timestamp is in UTC. Records are built only by the
//! normalizer and have no mutators.

use super::ids::{SubjectId, VendorId};
use super::result::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Declared terminology systems a UDM code may be drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminologySystem {
    /// ICD-10-CM diagnosis codes
    Icd10,
    /// SNOMED CT
    Snomed,
    /// LOINC observation codes
    Loinc,
    /// RxNorm medication codes
    RxNorm,
    /// CPT procedure codes
    Cpt,
    /// Local environmental exposure codes
    Environmental,
}

impl TerminologySystem {
    /// All declared systems
    pub const ALL: [TerminologySystem; 6] = [
        TerminologySystem::Icd10,
        TerminologySystem::Snomed,
        TerminologySystem::Loinc,
        TerminologySystem::RxNorm,
        TerminologySystem::Cpt,
        TerminologySystem::Environmental,
    ];

    /// Short key used in configuration files
    pub fn key(&self) -> &'static str {
        match self {
            Self::Icd10 => "icd10",
            Self::Snomed => "snomed",
            Self::Loinc => "loinc",
            Self::RxNorm => "rxnorm",
            Self::Cpt => "cpt",
            Self::Environmental => "environmental",
        }
    }

    /// Canonical FHIR system URI
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Icd10 => "http://hl7.org/fhir/sid/icd-10-cm",
            Self::Snomed => "http://snomed.info/sct",
            Self::Loinc => "http://loinc.org",
            Self::RxNorm => "http://www.nlm.nih.gov/research/umls/rxnorm",
            Self::Cpt => "http://www.ama-assn.org/go/cpt",
            Self::Environmental => "http://aegis-health.org/fhir/CodeSystem/environmental-exposure",
        }
    }

    /// Resolves a vendor system label (case-insensitive) or a system URI
    ///
    /// ```
    /// use aegis::domain::udm::TerminologySystem;
    ///
    /// assert_eq!(TerminologySystem::from_label("LN"), Some(TerminologySystem::Loinc));
    /// assert_eq!(TerminologySystem::from_label("I10"), Some(TerminologySystem::Icd10));
    /// assert_eq!(TerminologySystem::from_label("local-lab"), None);
    /// ```
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if let Some(system) = Self::ALL.iter().find(|s| s.uri() == label) {
            return Some(*system);
        }
        match label.to_ascii_lowercase().as_str() {
            "icd10" | "icd-10" | "icd10cm" | "icd-10-cm" | "i10" | "icd10-cm" => Some(Self::Icd10),
            "snomed" | "snomedct" | "snomed-ct" | "sct" => Some(Self::Snomed),
            "loinc" | "ln" => Some(Self::Loinc),
            "rxnorm" | "rxn" | "rx" => Some(Self::RxNorm),
            "cpt" | "cpt4" | "c4" => Some(Self::Cpt),
            "environmental" | "env" => Some(Self::Environmental),
            _ => None,
        }
    }
}

impl fmt::Display for TerminologySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for TerminologySystem {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("Unknown terminology system: {s}"))
    }
}

/// A code drawn from a declared terminology system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coding {
    pub system: TerminologySystem,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    /// Creates a new coding
    pub fn new(system: TerminologySystem, code: impl Into<String>, display: Option<String>) -> Self {
        Self {
            system,
            code: code.into(),
            display,
        }
    }
}

/// FHIR administrative gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    /// Maps vendor gender codes (M/F/O/U or words); anything else is `Unknown`
    pub fn from_vendor_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "M" | "MALE" => Self::Male,
            "F" | "FEMALE" => Self::Female,
            "O" | "OTHER" => Self::Other,
            _ => Self::Unknown,
        }
    }
}

/// Patient demographics; absent source fields stay `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Demographics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<AdministrativeGender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<String>,
}

/// A lab result or vital sign in canonical units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub id: String,
    pub coding: Coding,
    pub value: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective: Option<DateTime<Utc>>,
}

/// A diagnosis or problem-list entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub id: String,
    pub coding: Coding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abatement: Option<DateTime<Utc>>,
}

/// FHIR MedicationStatement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MedicationStatus {
    Active,
    Completed,
    Stopped,
    OnHold,
    Intended,
    EnteredInError,
    Unknown,
}

impl MedicationStatus {
    /// Maps a vendor status string; `None` when unrecognised
    pub fn from_vendor_status(status: &str) -> Option<Self> {
        let normalized = status.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "active" | "ordered" | "dispensed" => Some(Self::Active),
            "completed" | "complete" => Some(Self::Completed),
            "stopped" | "discontinued" | "cancelled" => Some(Self::Stopped),
            "on-hold" | "held" | "suspended" => Some(Self::OnHold),
            "intended" | "planned" => Some(Self::Intended),
            "entered-in-error" => Some(Self::EnteredInError),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Time interval with optional bounds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Period {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl Period {
    fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// A medication history entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicationStatement {
    pub id: String,
    pub coding: Coding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MedicationStatus>,
    #[serde(skip_serializing_if = "Period::is_empty")]
    pub period: Period,
}

/// An environmental exposure reading (air quality, pollen, weather)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentalReading {
    pub id: String,
    pub coding: Coding,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Canonical patient snapshot
///
/// Fields are only reachable through accessors; the normalizer is the only
/// producer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UdmRecord {
    pub(crate) subject: SubjectId,
    pub(crate) source_vendor: VendorId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) reference_time: Option<DateTime<Utc>>,
    pub(crate) demographics: Demographics,
    pub(crate) observations: Vec<Observation>,
    pub(crate) conditions: Vec<Condition>,
    pub(crate) medications: Vec<MedicationStatement>,
    pub(crate) environment: Vec<EnvironmentalReading>,
}

impl UdmRecord {
    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    pub fn source_vendor(&self) -> &VendorId {
        &self.source_vendor
    }

    /// Snapshot time: the explicit source reference time, or the latest
    /// timestamp carried by any element
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.reference_time
    }

    pub fn demographics(&self) -> &Demographics {
        &self.demographics
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn medications(&self) -> &[MedicationStatement] {
        &self.medications
    }

    pub fn environment(&self) -> &[EnvironmentalReading] {
        &self.environment
    }

    /// Literal references to the observations and conditions, in record order
    pub fn evidence_references(&self) -> Vec<String> {
        let subject = self.subject.fhir_id();
        self.observations
            .iter()
            .map(|o| format!("Observation/{subject}-{}", o.id))
            .chain(
                self.conditions
                    .iter()
                    .map(|c| format!("Condition/{subject}-{}", c.id)),
            )
            .collect()
    }

    /// Every coding in the record
    pub fn codings(&self) -> impl Iterator<Item = &Coding> {
        self.observations
            .iter()
            .map(|o| &o.coding)
            .chain(self.conditions.iter().map(|c| &c.coding))
            .chain(self.medications.iter().map(|m| &m.coding))
            .chain(self.environment.iter().map(|e| &e.coding))
    }

    /// Canonical JSON rendering; identical records render byte-identically
    pub fn canonical_json(&self) -> Result<String> {
        crate::core::fingerprint::canonical_json(self)
    }

    /// SHA-256 of [`UdmRecord::canonical_json`]
    pub fn fingerprint(&self) -> Result<String> {
        crate::core::fingerprint::fingerprint(self)
    }

    /// Latest timestamp carried by any element
    pub(crate) fn latest_element_time(&self) -> Option<DateTime<Utc>> {
        self.observations
            .iter()
            .filter_map(|o| o.effective)
            .chain(
                self.conditions
                    .iter()
                    .flat_map(|c| [c.onset, c.abatement])
                    .flatten(),
            )
            .chain(
                self.medications
                    .iter()
                    .flat_map(|m| [m.period.start, m.period.end])
                    .flatten(),
            )
            .chain(self.environment.iter().filter_map(|e| e.timestamp))
            .max()
    }
}
