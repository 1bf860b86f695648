//! UDM normalization
//!
//! Turns a vendor-tagged [`AttributeBag`] into a canonical [`UdmRecord`]:
//!
//! - **Terminology**: vendor codes resolved onto declared systems ([`TerminologyMap`])
//! - **Units**: measured values converted to the canonical unit of their code ([`UnitPolicy`])
//! - **Timestamps**: every timestamp converted to UTC ([`TimestampParser`])
//! - **Missing values**: absent source fields are omitted, never defaulted;
//!   only the subject identifier is mandatory
//!
//! Normalization is a pure function of the bag and the policy tables, so the
//! same bag always yields a byte-identical record.

pub mod terminology;
pub mod timestamps;
pub mod units;

pub use terminology::TerminologyMap;
pub use timestamps::TimestampParser;
pub use units::{Measurement, UnitConversion, UnitPolicy, UnitRule};

use crate::config::AegisConfig;
use crate::domain::{
    keys, AdministrativeGender, AegisError, AttributeBag, Attributes, Coding, Condition,
    Demographics, EnvironmentalReading, MedicationStatement, MedicationStatus,
    NormalizationError, Observation, Period, RawValue, Result, Section, SubjectId, UdmRecord,
    VendorId,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

type NormalizeResult<T> = std::result::Result<T, NormalizationError>;

/// Canonicalizes attribute bags with shared, read-only policy tables
#[derive(Debug, Clone)]
pub struct Normalizer {
    terminology: Arc<TerminologyMap>,
    units: Arc<UnitPolicy>,
    timestamps: TimestampParser,
}

impl Normalizer {
    pub fn new(
        terminology: Arc<TerminologyMap>,
        units: Arc<UnitPolicy>,
        timestamps: TimestampParser,
    ) -> Self {
        Self {
            terminology,
            units,
            timestamps,
        }
    }

    /// Builds the policy tables from configuration
    ///
    /// # Errors
    ///
    /// Returns `AegisError::Configuration` if a table entry or the source
    /// offset is invalid
    pub fn from_config(config: &AegisConfig) -> Result<Self> {
        let offset = config
            .pipeline
            .utc_offset()
            .map_err(AegisError::Configuration)?;
        let terminology = TerminologyMap::from_config(&config.terminology)?;
        let units = UnitPolicy::from_config(&config.units);

        tracing::debug!(
            unit_rules = units.len(),
            source_offset = %offset,
            "Normalizer policy tables loaded"
        );

        Ok(Self::new(
            Arc::new(terminology),
            Arc::new(units),
            TimestampParser::new(offset),
        ))
    }

    pub fn terminology(&self) -> &TerminologyMap {
        &self.terminology
    }

    pub fn units(&self) -> &UnitPolicy {
        &self.units
    }

    /// Normalizes one attribute bag
    ///
    /// # Errors
    ///
    /// - `MissingSubject` if the bag carries no subject identifier
    /// - `UnmappableCode` for a code with no mapping and no accepted fallback
    /// - `IncompatibleUnit` for a measurement outside the unit policy
    /// - `InvalidValue` / `InvalidTimestamp` for values that cannot be read
    ///
    /// # Examples
    ///
    /// ```
    /// use aegis::core::normalize::Normalizer;
    /// use aegis::domain::{keys, AttributeBag, Attributes, RawValue, Section, VendorId};
    ///
    /// let mut bag = AttributeBag::new(VendorId::new("epic").unwrap());
    /// bag.set_demographic(keys::SUBJECT_ID, "patient-123");
    /// let mut dx = Attributes::new();
    /// dx.insert(keys::CODE.to_string(), RawValue::from("J45"));
    /// bag.push_entry(Section::Condition, dx);
    ///
    /// let record = Normalizer::default().normalize(&bag).unwrap();
    /// assert_eq!(record.subject().as_str(), "patient-123");
    /// assert_eq!(record.conditions()[0].coding.code, "J45");
    /// ```
    pub fn normalize(&self, bag: &AttributeBag) -> NormalizeResult<UdmRecord> {
        let vendor = bag.vendor();
        let subject = self.subject(bag)?;
        let demographics = self.demographics(bag)?;
        let reference_time = self.optional_timestamp(
            bag.demographics(),
            keys::REFERENCE_TIME,
            keys::REFERENCE_TIME,
        )?;

        let observations = bag
            .entries_in(Section::Observation)
            .enumerate()
            .map(|(i, attrs)| self.observation(vendor, i, attrs))
            .collect::<NormalizeResult<Vec<_>>>()?;
        let conditions = bag
            .entries_in(Section::Condition)
            .enumerate()
            .map(|(i, attrs)| self.condition(vendor, i, attrs))
            .collect::<NormalizeResult<Vec<_>>>()?;
        let medications = bag
            .entries_in(Section::Medication)
            .enumerate()
            .map(|(i, attrs)| self.medication(vendor, i, attrs))
            .collect::<NormalizeResult<Vec<_>>>()?;
        let environment = bag
            .entries_in(Section::Environmental)
            .enumerate()
            .map(|(i, attrs)| self.environmental(vendor, i, attrs))
            .collect::<NormalizeResult<Vec<_>>>()?;

        let mut record = UdmRecord {
            subject,
            source_vendor: vendor.clone(),
            reference_time,
            demographics,
            observations,
            conditions,
            medications,
            environment,
        };
        if record.reference_time.is_none() {
            record.reference_time = record.latest_element_time();
        }

        tracing::debug!(
            vendor = %vendor,
            subject = %record.subject,
            observations = record.observations.len(),
            conditions = record.conditions.len(),
            medications = record.medications.len(),
            environment = record.environment.len(),
            "Attribute bag normalized"
        );

        Ok(record)
    }

    fn subject(&self, bag: &AttributeBag) -> NormalizeResult<SubjectId> {
        let raw = bag
            .demographic(keys::SUBJECT_ID)
            .and_then(present_text)
            .ok_or_else(|| NormalizationError::MissingSubject {
                vendor: bag.vendor().to_string(),
            })?;

        SubjectId::new(raw.as_str()).map_err(|reason| NormalizationError::InvalidValue {
            field: keys::SUBJECT_ID.to_string(),
            value: raw,
            reason,
        })
    }

    fn demographics(&self, bag: &AttributeBag) -> NormalizeResult<Demographics> {
        let attrs = bag.demographics();
        let birth_date = attrs
            .get(keys::BIRTH_DATE)
            .filter(|raw| present_text(raw).is_some())
            .map(|raw| self.timestamps.parse_date(keys::BIRTH_DATE, raw))
            .transpose()?;

        Ok(Demographics {
            birth_date,
            gender: text(attrs, keys::GENDER).map(|g| AdministrativeGender::from_vendor_code(&g)),
            race: text(attrs, keys::RACE),
            ethnicity: text(attrs, keys::ETHNICITY),
        })
    }

    fn coding(
        &self,
        vendor: &VendorId,
        section: Section,
        index: usize,
        attrs: &Attributes,
    ) -> NormalizeResult<Coding> {
        let field = entry_field(section, index, keys::CODE);
        let code = text(attrs, keys::CODE).ok_or_else(|| NormalizationError::InvalidValue {
            field: field.clone(),
            value: String::new(),
            reason: "code is required".to_string(),
        })?;
        let system = text(attrs, keys::SYSTEM);
        let display = text(attrs, keys::DISPLAY);

        self.terminology.resolve(
            vendor,
            section,
            &field,
            system.as_deref(),
            &code,
            display.as_deref(),
        )
    }

    fn observation(
        &self,
        vendor: &VendorId,
        index: usize,
        attrs: &Attributes,
    ) -> NormalizeResult<Observation> {
        let section = Section::Observation;
        let coding = self.coding(vendor, section, index, attrs)?;
        let value = required_number(attrs, keys::VALUE, &entry_field(section, index, keys::VALUE))?;
        let unit = text(attrs, keys::UNIT);
        let measurement = self.units.convert(
            &entry_field(section, index, keys::UNIT),
            &coding.code,
            value,
            unit.as_deref(),
        )?;

        Ok(Observation {
            id: format!("obs-{}", index + 1),
            coding,
            value: measurement.value,
            unit: measurement.unit,
            effective: self.optional_timestamp(
                attrs,
                keys::TIMESTAMP,
                &entry_field(section, index, keys::TIMESTAMP),
            )?,
        })
    }

    fn condition(
        &self,
        vendor: &VendorId,
        index: usize,
        attrs: &Attributes,
    ) -> NormalizeResult<Condition> {
        let section = Section::Condition;
        Ok(Condition {
            id: format!("cond-{}", index + 1),
            coding: self.coding(vendor, section, index, attrs)?,
            onset: self.optional_timestamp(
                attrs,
                keys::ONSET,
                &entry_field(section, index, keys::ONSET),
            )?,
            abatement: self.optional_timestamp(
                attrs,
                keys::ABATEMENT,
                &entry_field(section, index, keys::ABATEMENT),
            )?,
        })
    }

    fn medication(
        &self,
        vendor: &VendorId,
        index: usize,
        attrs: &Attributes,
    ) -> NormalizeResult<MedicationStatement> {
        let section = Section::Medication;
        let coding = self.coding(vendor, section, index, attrs)?;

        let status = match text(attrs, keys::STATUS) {
            Some(raw) => Some(MedicationStatus::from_vendor_status(&raw).ok_or_else(|| {
                NormalizationError::InvalidValue {
                    field: entry_field(section, index, keys::STATUS),
                    value: raw.clone(),
                    reason: "unrecognised medication status".to_string(),
                }
            })?),
            None => None,
        };

        let period = Period {
            start: self.optional_timestamp(
                attrs,
                keys::PERIOD_START,
                &entry_field(section, index, keys::PERIOD_START),
            )?,
            end: self.optional_timestamp(
                attrs,
                keys::PERIOD_END,
                &entry_field(section, index, keys::PERIOD_END),
            )?,
        };

        Ok(MedicationStatement {
            id: format!("med-{}", index + 1),
            coding,
            status,
            period,
        })
    }

    fn environmental(
        &self,
        vendor: &VendorId,
        index: usize,
        attrs: &Attributes,
    ) -> NormalizeResult<EnvironmentalReading> {
        let section = Section::Environmental;
        let coding = self.coding(vendor, section, index, attrs)?;
        let value = required_number(attrs, keys::VALUE, &entry_field(section, index, keys::VALUE))?;
        let unit = text(attrs, keys::UNIT);

        let (value, unit) = match self.units.rule(&coding.code) {
            Some(_) => {
                let m = self.units.convert(
                    &entry_field(section, index, keys::UNIT),
                    &coding.code,
                    value,
                    unit.as_deref(),
                )?;
                (m.value, Some(m.unit))
            }
            None => (value, unit),
        };

        Ok(EnvironmentalReading {
            id: format!("env-{}", index + 1),
            coding,
            value,
            unit,
            timestamp: self.optional_timestamp(
                attrs,
                keys::TIMESTAMP,
                &entry_field(section, index, keys::TIMESTAMP),
            )?,
        })
    }

    fn optional_timestamp(
        &self,
        attrs: &Attributes,
        key: &str,
        field: &str,
    ) -> NormalizeResult<Option<DateTime<Utc>>> {
        attrs
            .get(key)
            .filter(|raw| present_text(raw).is_some())
            .map(|raw| self.timestamps.parse(field, raw))
            .transpose()
    }
}

impl Default for Normalizer {
    /// Built-in policy tables with UTC source timestamps
    fn default() -> Self {
        Self::new(
            Arc::new(TerminologyMap::builtin()),
            Arc::new(UnitPolicy::builtin()),
            TimestampParser::utc(),
        )
    }
}

fn entry_field(section: Section, index: usize, key: &str) -> String {
    format!("{}[{index}].{key}", section.label())
}

/// Text rendering of a value; blank text counts as absent
fn present_text(raw: &RawValue) -> Option<String> {
    match raw {
        RawValue::Text(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        other => Some(other.to_string()),
    }
}

fn text(attrs: &Attributes, key: &str) -> Option<String> {
    attrs.get(key).and_then(present_text)
}

fn required_number(attrs: &Attributes, key: &str, field: &str) -> NormalizeResult<f64> {
    let invalid = |value: String, reason: &str| NormalizationError::InvalidValue {
        field: field.to_string(),
        value,
        reason: reason.to_string(),
    };

    let value = match attrs.get(key) {
        Some(RawValue::Number(n)) => *n,
        Some(raw) => {
            let text = present_text(raw).ok_or_else(|| invalid(String::new(), "value is required"))?;
            text.parse::<f64>()
                .map_err(|_| invalid(text.clone(), "expected a number"))?
        }
        None => return Err(invalid(String::new(), "value is required")),
    };

    if !value.is_finite() {
        return Err(invalid(value.to_string(), "expected a finite number"));
    }
    Ok(value)
}
