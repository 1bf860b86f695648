//! Forecast resource
//!
//! [`ForecastResource`] models the AegisHealthForecast profile with typed
//! fields: exactly one horizon, exactly one model metadata block, and a method
//! drawn from the closed code system. It is produced only by
//! [`ForecastBuilder`](super::ForecastBuilder) and never mutated afterwards.

use super::model::{
    Annotation, CodeableConcept, Coding, Extension, Meta, Prediction, Quantity, Range, Reference,
    RiskAssessment,
};
use super::profile;
use crate::domain::{
    AegisError, ContributingFactor, ForecastHorizon, ForecastMethod, ModelMetadata, Result,
    SubjectId,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

/// A validated health-forecast `RiskAssessment`
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResource {
    pub(crate) id: Uuid,
    pub(crate) subject: SubjectId,
    pub(crate) method: ForecastMethod,
    pub(crate) basis: Vec<String>,
    pub(crate) occurrence: DateTime<Utc>,
    pub(crate) window_end: DateTime<Utc>,
    pub(crate) outcome: String,
    pub(crate) probability: f64,
    pub(crate) horizon: ForecastHorizon,
    pub(crate) model_metadata: ModelMetadata,
    pub(crate) factors: Vec<ContributingFactor>,
    pub(crate) record_fingerprint: String,
}

impl ForecastResource {
    /// Deterministic resource id (UUID v5 of the record fingerprint and input)
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    pub fn method(&self) -> ForecastMethod {
        self.method
    }

    /// Evidence references (`Observation/...`, `Condition/...`)
    pub fn basis(&self) -> &[String] {
        &self.basis
    }

    /// The record's reference time; start of the forecast window
    pub fn occurrence(&self) -> DateTime<Utc> {
        self.occurrence
    }

    pub fn outcome(&self) -> &str {
        &self.outcome
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn horizon(&self) -> ForecastHorizon {
        self.horizon
    }

    pub fn model_metadata(&self) -> &ModelMetadata {
        &self.model_metadata
    }

    /// Contributing factors, highest weight first
    pub fn contributing_factors(&self) -> &[ContributingFactor] {
        &self.factors
    }

    /// SHA-256 fingerprint of the UDM record the forecast was built from
    pub fn record_fingerprint(&self) -> &str {
        &self.record_fingerprint
    }

    /// Absolute forecast window `[occurrence, occurrence + horizon]`
    pub fn forecast_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.occurrence, self.window_end)
    }

    /// Renders the wire `RiskAssessment`
    pub fn to_fhir(&self) -> RiskAssessment {
        RiskAssessment {
            resource_type: profile::RESOURCE_TYPE.to_string(),
            id: Some(self.id.to_string()),
            meta: Some(Meta {
                profile: vec![profile::PROFILE_URL.to_string()],
            }),
            extension: vec![self.horizon_extension(), self.model_metadata_extension()],
            status: Some(profile::DEFAULT_STATUS.to_string()),
            method: Some(CodeableConcept {
                coding: vec![Coding {
                    system: Some(profile::FORECAST_METHOD_SYSTEM.to_string()),
                    code: Some(self.method.code().to_string()),
                    display: Some(self.method.display().to_string()),
                }],
                text: None,
            }),
            subject: Some(Reference::to(self.subject.reference())),
            occurrence_date_time: Some(
                self.occurrence
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            basis: self.basis.iter().map(Reference::to).collect(),
            prediction: vec![Prediction {
                outcome: Some(CodeableConcept::text(&self.outcome)),
                probability_decimal: Some(self.probability),
                when_range: Some(Range {
                    low: Some(horizon_quantity(0, self.horizon)),
                    high: Some(horizon_quantity(self.horizon.value, self.horizon)),
                }),
                rationale: self.rationale(),
            }],
            note: self
                .factors
                .iter()
                .map(|f| Annotation {
                    text: format!(
                        "Contributing factor {}: weight {}",
                        factor_label(f),
                        f.weight
                    ),
                })
                .collect(),
        }
    }

    /// Wire resource as a JSON value
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self.to_fhir()).map_err(|e| AegisError::Serialization(e.to_string()))
    }

    /// Wire resource as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_fhir())
            .map_err(|e| AegisError::Serialization(e.to_string()))
    }

    fn horizon_extension(&self) -> Extension {
        let duration = horizon_quantity(self.horizon.value, self.horizon);
        Extension::with_value(
            profile::FORECAST_HORIZON_URL,
            "valueDuration",
            json!(duration),
        )
    }

    fn model_metadata_extension(&self) -> Extension {
        let meta = &self.model_metadata;
        let mut children = Vec::new();

        if !meta.model_name.trim().is_empty() {
            children.push(Extension::with_value(
                profile::MODEL_NAME,
                "valueString",
                json!(meta.model_name),
            ));
        }
        if !meta.model_version.trim().is_empty() {
            children.push(Extension::with_value(
                profile::MODEL_VERSION,
                "valueString",
                json!(meta.model_version),
            ));
        }
        if let Some(training) = meta.training_data.as_deref().filter(|t| !t.trim().is_empty()) {
            children.push(Extension::with_value(
                profile::TRAINING_DATA,
                "valueString",
                json!(training),
            ));
        }
        if let Some(score) = meta.confidence_score {
            children.push(Extension::with_value(
                profile::CONFIDENCE_SCORE,
                "valueDecimal",
                json!(score),
            ));
        }

        Extension::nested(profile::MODEL_METADATA_URL, children)
    }

    fn rationale(&self) -> Option<String> {
        if self.factors.is_empty() {
            return None;
        }
        let factors = self
            .factors
            .iter()
            .map(|f| format!("{} ({})", factor_label(f), f.weight))
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!("Contributing factors: {factors}"))
    }
}

fn horizon_quantity(value: u32, horizon: ForecastHorizon) -> Quantity {
    Quantity {
        value: Some(f64::from(value)),
        unit: Some(horizon.unit.name().to_string()),
        system: Some(profile::UCUM_SYSTEM.to_string()),
        code: Some(horizon.unit.ucum().to_string()),
    }
}

fn factor_label(factor: &ContributingFactor) -> String {
    match &factor.display {
        Some(display) => format!("{} [{}]", display, factor.code),
        None => factor.code.clone(),
    }
}
