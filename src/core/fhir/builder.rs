//! Forecast resource builder
//!
//! Combines a UDM record with an externally computed [`ForecastInput`] into a
//! [`ForecastResource`]. Building is all-or-nothing: input is checked up
//! front, the rendered resource is run through the profile validator, and the
//! caller receives either a conforming resource or an error.

use super::resource::ForecastResource;
use super::validator;
use crate::config::PipelineConfig;
use crate::core::fingerprint;
use crate::domain::{
    BuildError, ContributingFactor, ForecastHorizon, ForecastInput, ForecastMethod, HorizonUnit,
    Result, UdmRecord,
};
use chrono::{DateTime, Datelike, Duration, Months, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

/// Outcome text used when the forecast input names none
pub const DEFAULT_OUTCOME: &str = "Adverse health event";

/// Builds profile-conformant forecast resources
#[derive(Debug, Clone)]
pub struct ForecastBuilder {
    default_outcome: String,
}

impl ForecastBuilder {
    pub fn new(default_outcome: impl Into<String>) -> Self {
        Self {
            default_outcome: default_outcome.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.default_outcome.trim())
    }

    /// Builds and self-validates a forecast resource
    ///
    /// # Errors
    ///
    /// - `BuildError::InvalidMethod` if the method is outside the code system
    /// - `BuildError::OutOfRange` for a probability, confidence score, factor
    ///   weight, or horizon outside its permitted range
    /// - `BuildError::MissingReferenceTime` if the record has no reference time
    /// - `BuildError::Validation` if the rendered resource violates the profile
    ///
    /// # Examples
    ///
    /// ```
    /// use aegis::core::fhir::ForecastBuilder;
    /// use aegis::core::normalize::Normalizer;
    /// use aegis::domain::*;
    ///
    /// let mut bag = AttributeBag::new(VendorId::new("epic").unwrap());
    /// bag.set_demographic(keys::SUBJECT_ID, "patient-123");
    /// bag.set_demographic(keys::REFERENCE_TIME, "2024-03-01T00:00:00Z");
    /// let record = Normalizer::default().normalize(&bag).unwrap();
    ///
    /// let input = ForecastInput::new(
    ///     "random-forest",
    ///     0.72,
    ///     ForecastHorizon::days(30),
    ///     ModelMetadata::new("AegisBERT", "1.2.0"),
    /// );
    /// let err = ForecastBuilder::default().build(&record, &input).unwrap_err();
    /// assert!(matches!(err, AegisError::Build(BuildError::InvalidMethod { .. })));
    /// ```
    pub fn build(&self, record: &UdmRecord, input: &ForecastInput) -> Result<ForecastResource> {
        let method = parse_method(&input.method)?;
        check_unit_interval("probability", input.probability)?;
        if let Some(score) = input.model_metadata.confidence_score {
            check_unit_interval("modelMetadata.confidenceScore", score)?;
        }
        for (i, factor) in input.contributing_factors.iter().enumerate() {
            check_range(&format!("contributingFactors[{i}].weight"), factor.weight, -1.0, 1.0)?;
        }
        if input.horizon.value == 0 {
            return Err(out_of_range("horizon.value", 0.0, 1.0, f64::from(u32::MAX)).into());
        }

        let occurrence = record
            .reference_time()
            .ok_or_else(|| BuildError::MissingReferenceTime {
                subject: record.subject().to_string(),
            })?;
        let window_end = window_end(occurrence, input.horizon)?;

        let record_fingerprint = record.fingerprint()?;
        let input_json = fingerprint::canonical_json(input)?;
        let id = Uuid::new_v5(
            &Uuid::NAMESPACE_URL,
            format!("{}/{record_fingerprint}/{input_json}", super::profile::PROFILE_URL).as_bytes(),
        );

        let outcome = input
            .outcome
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or(&self.default_outcome)
            .to_string();

        let resource = ForecastResource {
            id,
            subject: record.subject().clone(),
            method,
            basis: record.evidence_references(),
            occurrence,
            window_end,
            outcome,
            probability: input.probability,
            horizon: input.horizon,
            model_metadata: input.model_metadata.clone(),
            factors: sorted_factors(&input.contributing_factors),
            record_fingerprint,
        };

        validator::validate(&resource.to_fhir()).map_err(BuildError::from)?;

        tracing::debug!(
            subject = %resource.subject,
            method = method.code(),
            probability = resource.probability,
            basis = resource.basis.len(),
            "Forecast resource built"
        );

        Ok(resource)
    }
}

impl Default for ForecastBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_OUTCOME)
    }
}

fn parse_method(code: &str) -> std::result::Result<ForecastMethod, BuildError> {
    code.parse::<ForecastMethod>()
        .map_err(|_| BuildError::InvalidMethod {
            code: code.to_string(),
            allowed: ForecastMethod::allowed_codes(),
        })
}

fn out_of_range(field: &str, value: f64, min: f64, max: f64) -> BuildError {
    BuildError::OutOfRange {
        field: field.to_string(),
        value,
        min,
        max,
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> std::result::Result<(), BuildError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range(field, value, min, max))
    }
}

fn check_unit_interval(field: &str, value: f64) -> std::result::Result<(), BuildError> {
    check_range(field, value, 0.0, 1.0)
}

/// `start + horizon`; calendar units use calendar arithmetic
fn window_end(
    start: DateTime<Utc>,
    horizon: ForecastHorizon,
) -> std::result::Result<DateTime<Utc>, BuildError> {
    let n = horizon.value;
    let end = match horizon.unit {
        HorizonUnit::Hours => start.checked_add_signed(Duration::hours(i64::from(n))),
        HorizonUnit::Days => start.checked_add_signed(Duration::days(i64::from(n))),
        HorizonUnit::Weeks => start.checked_add_signed(Duration::weeks(i64::from(n))),
        HorizonUnit::Months => start.checked_add_months(Months::new(n)),
        HorizonUnit::Years => n
            .checked_mul(12)
            .and_then(|months| start.checked_add_months(Months::new(months))),
    };
    end.ok_or_else(|| {
        out_of_range("horizon.value", f64::from(n), 1.0, max_horizon(start, horizon.unit))
    })
}

/// Largest horizon (in `unit`) that still fits the calendar from `start`
fn max_horizon(start: DateTime<Utc>, unit: HorizonUnit) -> f64 {
    let room = DateTime::<Utc>::MAX_UTC - start;
    let whole_months = || {
        i64::from(DateTime::<Utc>::MAX_UTC.year() - start.year()) * 12 - 12
    };
    let max = match unit {
        HorizonUnit::Hours => room.num_hours(),
        HorizonUnit::Days => room.num_days(),
        HorizonUnit::Weeks => room.num_weeks(),
        HorizonUnit::Months => whole_months(),
        HorizonUnit::Years => whole_months() / 12,
    };
    max as f64
}

/// Highest weight first; ties keep input order
fn sorted_factors(factors: &[ContributingFactor]) -> Vec<ContributingFactor> {
    let mut sorted = factors.to_vec();
    sorted.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::Normalizer;
    use crate::domain::{keys, AegisError, Attributes, AttributeBag, ModelMetadata, RawValue, Section, VendorId};
    use chrono::TimeZone;

    fn record() -> UdmRecord {
        let mut bag = AttributeBag::new(VendorId::new("epic").unwrap());
        bag.set_demographic(keys::SUBJECT_ID, "patient-123");
        bag.set_demographic(keys::REFERENCE_TIME, "2024-03-01T00:00:00Z");
        let mut dx = Attributes::new();
        dx.insert(keys::CODE.to_string(), RawValue::from("J45"));
        bag.push_entry(Section::Condition, dx);
        Normalizer::default().normalize(&bag).unwrap()
    }

    fn input() -> ForecastInput {
        ForecastInput::new(
            "bert-clinical",
            0.72,
            ForecastHorizon::days(30),
            ModelMetadata::new("AegisBERT", "1.2.0"),
        )
    }

    fn build_err(input: &ForecastInput) -> BuildError {
        match ForecastBuilder::default().build(&record(), input) {
            Err(AegisError::Build(err)) => err,
            other => panic!("expected build error, got {other:?}"),
        }
    }

    #[test]
    fn test_build_populates_resource() {
        let resource = ForecastBuilder::default().build(&record(), &input()).unwrap();
        assert_eq!(resource.subject().as_str(), "patient-123");
        assert_eq!(resource.method(), ForecastMethod::BertClinical);
        assert_eq!(resource.probability(), 0.72);
        assert_eq!(resource.horizon(), ForecastHorizon::days(30));
        assert_eq!(resource.basis(), ["Condition/patient-123-cond-1".to_string()]);
        assert_eq!(resource.outcome(), DEFAULT_OUTCOME);
        assert_eq!(resource.record_fingerprint(), record().fingerprint().unwrap());
        assert_eq!(
            resource.forecast_window(),
            (
                Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()
            )
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = ForecastBuilder::default();
        let a = builder.build(&record(), &input()).unwrap();
        let b = builder.build(&record(), &input()).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());

        let other = builder
            .build(&record(), &ForecastInput { probability: 0.5, ..input() })
            .unwrap();
        assert_ne!(a.id(), other.id());
    }

    #[test]
    fn test_invalid_method() {
        let err = build_err(&ForecastInput { method: "random-forest".to_string(), ..input() });
        assert_eq!(
            err,
            BuildError::InvalidMethod {
                code: "random-forest".to_string(),
                allowed: "bert-clinical, survival-analysis, time-series, ensemble".to_string()
            }
        );
        let err = build_err(&ForecastInput { method: "Ensemble".to_string(), ..input() });
        assert!(matches!(err, BuildError::InvalidMethod { .. }));
    }

    #[test]
    fn test_probability_out_of_range() {
        for p in [1.5, -0.1, f64::NAN, f64::INFINITY] {
            let err = build_err(&ForecastInput { probability: p, ..input() });
            assert!(
                matches!(err, BuildError::OutOfRange { ref field, .. } if field == "probability"),
                "probability {p}"
            );
        }
    }

    #[test]
    fn test_confidence_score_out_of_range() {
        let metadata = ModelMetadata::new("AegisBERT", "1.2.0").with_confidence_score(1.01);
        let err = build_err(&ForecastInput { model_metadata: metadata, ..input() });
        assert!(matches!(
            err,
            BuildError::OutOfRange { ref field, .. } if field == "modelMetadata.confidenceScore"
        ));
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let err = build_err(&ForecastInput { horizon: ForecastHorizon::days(0), ..input() });
        assert!(matches!(err, BuildError::OutOfRange { ref field, .. } if field == "horizon.value"));
    }

    #[test]
    fn test_calendar_horizons() {
        let start = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        assert_eq!(
            window_end(start, ForecastHorizon::new(1, HorizonUnit::Months)).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
        assert_eq!(
            window_end(start, ForecastHorizon::new(2, HorizonUnit::Years)).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap()
        );
        assert_eq!(
            window_end(start, ForecastHorizon::new(36, HorizonUnit::Hours)).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap()
        );
        assert!(window_end(start, ForecastHorizon::new(u32::MAX, HorizonUnit::Years)).is_err());
    }

    #[test]
    fn test_missing_reference_time() {
        let mut bag = AttributeBag::new(VendorId::new("epic").unwrap());
        bag.set_demographic(keys::SUBJECT_ID, "patient-9");
        let record = Normalizer::default().normalize(&bag).unwrap();
        let err = ForecastBuilder::default().build(&record, &input()).unwrap_err();
        assert!(matches!(
            err,
            AegisError::Build(BuildError::MissingReferenceTime { ref subject }) if subject == "patient-9"
        ));
    }

    #[test]
    fn test_missing_model_version_fails_self_check() {
        let metadata = ModelMetadata::new("AegisBERT", "");
        let err = build_err(&ForecastInput { model_metadata: metadata, ..input() });
        match err {
            BuildError::Validation(v) => {
                assert_eq!(v.violations.len(), 1);
                assert!(v.violations[0].path.contains("modelVersion"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_factors_sorted_by_weight() {
        let input = input()
            .with_factor(ContributingFactor::new("pm25", 0.1))
            .with_factor(ContributingFactor::new("J45", 0.6))
            .with_factor(ContributingFactor::new("8867-4", -0.2));
        let resource = ForecastBuilder::default().build(&record(), &input).unwrap();
        let codes: Vec<&str> = resource
            .contributing_factors()
            .iter()
            .map(|f| f.code.as_str())
            .collect();
        assert_eq!(codes, vec!["J45", "pm25", "8867-4"]);
    }

    #[test]
    fn test_outcome_override() {
        let resource = ForecastBuilder::new("Hospital admission")
            .build(&record(), &input().with_outcome("Asthma exacerbation"))
            .unwrap();
        assert_eq!(resource.outcome(), "Asthma exacerbation");

        let resource = ForecastBuilder::new("Hospital admission")
            .build(&record(), &input())
            .unwrap();
        assert_eq!(resource.outcome(), "Hospital admission");
    }
}
