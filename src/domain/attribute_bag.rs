//! Intermediate attribute bag
//!
//! Vendor adapters translate vendor field names into the canonical attribute
//! keys in [`keys`], but leave the values untouched: units are still vendor
//! units, codes are still vendor-local, timestamps are still vendor-formatted.
//! The normalizer consumes the bag immediately.

use super::ids::VendorId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical attribute keys shared by every adapter and the normalizer
pub mod keys {
    pub const SUBJECT_ID: &str = "subject_id";
    pub const BIRTH_DATE: &str = "birth_date";
    pub const GENDER: &str = "gender";
    pub const RACE: &str = "race";
    pub const ETHNICITY: &str = "ethnicity";
    pub const REFERENCE_TIME: &str = "reference_time";

    pub const CODE: &str = "code";
    pub const SYSTEM: &str = "system";
    pub const DISPLAY: &str = "display";
    pub const VALUE: &str = "value";
    pub const UNIT: &str = "unit";
    pub const TIMESTAMP: &str = "timestamp";
    pub const ONSET: &str = "onset";
    pub const ABATEMENT: &str = "abatement";
    pub const STATUS: &str = "status";
    pub const PERIOD_START: &str = "period_start";
    pub const PERIOD_END: &str = "period_end";
}

/// A raw value exactly as the vendor supplied it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum RawValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl RawValue {
    /// Returns the text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(s) => write!(f, "{s}"),
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(value: NaiveDate) -> Self {
        RawValue::Date(value)
    }
}

/// Canonical attribute key to raw value
pub type Attributes = BTreeMap<String, RawValue>;

/// Clinical section an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Observation,
    Condition,
    Medication,
    Environmental,
}

impl Section {
    /// Plural label used in diagnostic field paths
    pub fn label(&self) -> &'static str {
        match self {
            Section::Observation => "observations",
            Section::Condition => "conditions",
            Section::Medication => "medications",
            Section::Environmental => "environment",
        }
    }
}

/// One repeated entry (a lab result, a diagnosis, a prescription, a reading)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagEntry {
    pub section: Section,
    pub attributes: Attributes,
}

/// Vendor-tagged attribute bag produced by one `adapt` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeBag {
    vendor: VendorId,
    demographics: Attributes,
    entries: Vec<BagEntry>,
}

impl AttributeBag {
    /// Creates an empty bag for a vendor
    pub fn new(vendor: VendorId) -> Self {
        Self {
            vendor,
            demographics: Attributes::new(),
            entries: Vec::new(),
        }
    }

    /// Originating vendor
    pub fn vendor(&self) -> &VendorId {
        &self.vendor
    }

    /// Sets a patient-level attribute, replacing any previous value
    pub fn set_demographic(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.demographics.insert(key.into(), value.into());
    }

    /// Looks up a patient-level attribute
    pub fn demographic(&self, key: &str) -> Option<&RawValue> {
        self.demographics.get(key)
    }

    /// All patient-level attributes
    pub fn demographics(&self) -> &Attributes {
        &self.demographics
    }

    /// Appends a repeated entry, preserving source order
    pub fn push_entry(&mut self, section: Section, attributes: Attributes) {
        self.entries.push(BagEntry {
            section,
            attributes,
        });
    }

    /// All entries in source order
    pub fn entries(&self) -> &[BagEntry] {
        &self.entries
    }

    /// Entries of one section in source order
    pub fn entries_in(&self, section: Section) -> impl Iterator<Item = &Attributes> {
        self.entries
            .iter()
            .filter(move |e| e.section == section)
            .map(|e| &e.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epic() -> VendorId {
        VendorId::new("epic").unwrap()
    }

    #[test]
    fn test_bag_demographics() {
        let mut bag = AttributeBag::new(epic());
        bag.set_demographic(keys::SUBJECT_ID, "patient-123");
        assert_eq!(
            bag.demographic(keys::SUBJECT_ID),
            Some(&RawValue::Text("patient-123".to_string()))
        );
        assert!(bag.demographic(keys::GENDER).is_none());
    }

    #[test]
    fn test_entries_in_section_preserve_order() {
        let mut bag = AttributeBag::new(epic());
        for code in ["J45", "I10"] {
            let mut attrs = Attributes::new();
            attrs.insert(keys::CODE.to_string(), code.into());
            bag.push_entry(Section::Condition, attrs);
        }
        let mut obs = Attributes::new();
        obs.insert(keys::CODE.to_string(), "8480-6".into());
        bag.push_entry(Section::Observation, obs);

        let codes: Vec<String> = bag
            .entries_in(Section::Condition)
            .map(|a| a[keys::CODE].to_string())
            .collect();
        assert_eq!(codes, vec!["J45", "I10"]);
        assert_eq!(bag.entries().len(), 3);
    }

    #[test]
    fn test_raw_value_display() {
        assert_eq!(RawValue::from("abc").to_string(), "abc");
        assert_eq!(RawValue::from(120.5).to_string(), "120.5");
        let date = NaiveDate::from_ymd_opt(1980, 1, 1).unwrap();
        assert_eq!(RawValue::from(date).to_string(), "1980-01-01");
    }

    #[test]
    fn test_raw_value_text_is_not_reinterpreted() {
        let value = RawValue::from("2020-01-01");
        let json = serde_json::to_string(&value).unwrap();
        let back: RawValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
