//! Forecast input supplied by the forecasting-model collaborator
//!
//! Aegis never computes probabilities itself; a [`ForecastInput`] arrives
//! already computed and is combined with a UDM record by the resource builder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed forecast-method code system
///
/// Codes are case-sensitive. Adding a method is a versioned change to this
/// enum and to the published value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForecastMethod {
    #[serde(rename = "bert-clinical")]
    BertClinical,
    #[serde(rename = "survival-analysis")]
    SurvivalAnalysis,
    #[serde(rename = "time-series")]
    TimeSeries,
    #[serde(rename = "ensemble")]
    Ensemble,
}

impl ForecastMethod {
    /// Every member of the code system, in declaration order
    pub const ALL: [ForecastMethod; 4] = [
        ForecastMethod::BertClinical,
        ForecastMethod::SurvivalAnalysis,
        ForecastMethod::TimeSeries,
        ForecastMethod::Ensemble,
    ];

    /// Code as published in the code system
    pub fn code(&self) -> &'static str {
        match self {
            Self::BertClinical => "bert-clinical",
            Self::SurvivalAnalysis => "survival-analysis",
            Self::TimeSeries => "time-series",
            Self::Ensemble => "ensemble",
        }
    }

    /// Display text as published in the code system
    pub fn display(&self) -> &'static str {
        match self {
            Self::BertClinical => "BERT Clinical Model",
            Self::SurvivalAnalysis => "Survival Analysis",
            Self::TimeSeries => "Time Series Forecasting",
            Self::Ensemble => "Ensemble Model",
        }
    }

    /// Comma-separated list of every code, for diagnostics
    pub fn allowed_codes() -> String {
        Self::ALL
            .iter()
            .map(|m| m.code())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ForecastMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for ForecastMethod {
    type Err = String;

    /// Exact, case-sensitive match against the code system
    ///
    /// ```
    /// use aegis::domain::forecast::ForecastMethod;
    ///
    /// assert_eq!("ensemble".parse::<ForecastMethod>(), Ok(ForecastMethod::Ensemble));
    /// assert!("Ensemble".parse::<ForecastMethod>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.code() == s)
            .ok_or_else(|| format!("'{s}' is not a forecast method code"))
    }
}

/// Calendar unit of a forecast horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizonUnit {
    #[serde(alias = "h", alias = "hour")]
    Hours,
    #[serde(alias = "d", alias = "day")]
    Days,
    #[serde(alias = "wk", alias = "week")]
    Weeks,
    #[serde(alias = "mo", alias = "month")]
    Months,
    #[serde(alias = "a", alias = "year")]
    Years,
}

impl HorizonUnit {
    /// UCUM code
    pub fn ucum(&self) -> &'static str {
        match self {
            Self::Hours => "h",
            Self::Days => "d",
            Self::Weeks => "wk",
            Self::Months => "mo",
            Self::Years => "a",
        }
    }

    /// Human-readable plural name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        }
    }

    /// Inverse of [`HorizonUnit::ucum`]
    pub fn from_ucum(code: &str) -> Option<Self> {
        match code {
            "h" => Some(Self::Hours),
            "d" => Some(Self::Days),
            "wk" => Some(Self::Weeks),
            "mo" => Some(Self::Months),
            "a" => Some(Self::Years),
            _ => None,
        }
    }
}

/// Forecast time horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForecastHorizon {
    pub value: u32,
    pub unit: HorizonUnit,
}

impl ForecastHorizon {
    pub fn new(value: u32, unit: HorizonUnit) -> Self {
        Self { value, unit }
    }

    pub fn days(value: u32) -> Self {
        Self::new(value, HorizonUnit::Days)
    }
}

impl fmt::Display for ForecastHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.name())
    }
}

/// A feature that contributed to the forecast, with its attribution weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub code: String,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl ContributingFactor {
    pub fn new(code: impl Into<String>, weight: f64) -> Self {
        Self {
            code: code.into(),
            weight,
            display: None,
        }
    }
}

/// Provenance of the model that produced the forecast
///
/// An empty `model_name` or `model_version` is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default, alias = "modelName")]
    pub model_name: String,
    #[serde(default, alias = "modelVersion")]
    pub model_version: String,
    #[serde(default, alias = "trainingData", skip_serializing_if = "Option::is_none")]
    pub training_data: Option<String>,
    #[serde(default, alias = "confidenceScore", skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

impl ModelMetadata {
    pub fn new(model_name: impl Into<String>, model_version: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            model_version: model_version.into(),
            training_data: None,
            confidence_score: None,
        }
    }

    pub fn with_training_data(mut self, training_data: impl Into<String>) -> Self {
        self.training_data = Some(training_data.into());
        self
    }

    pub fn with_confidence_score(mut self, score: f64) -> Self {
        self.confidence_score = Some(score);
        self
    }
}

/// Forecast result as delivered by the model collaborator
///
/// The method is kept as the raw code so that an out-of-system code reaches
/// the builder and is rejected there with full context.
///
/// # Examples
///
/// ```
/// use aegis::domain::forecast::{ForecastHorizon, ForecastInput, ModelMetadata};
///
/// let input = ForecastInput::new(
///     "bert-clinical",
///     0.72,
///     ForecastHorizon::days(30),
///     ModelMetadata::new("AegisBERT", "1.2.0"),
/// );
/// assert_eq!(input.method, "bert-clinical");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInput {
    pub method: String,
    pub probability: f64,
    pub horizon: ForecastHorizon,
    #[serde(default, alias = "contributingFactors")]
    pub contributing_factors: Vec<ContributingFactor>,
    #[serde(alias = "modelMetadata")]
    pub model_metadata: ModelMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

impl ForecastInput {
    pub fn new(
        method: impl Into<String>,
        probability: f64,
        horizon: ForecastHorizon,
        model_metadata: ModelMetadata,
    ) -> Self {
        Self {
            method: method.into(),
            probability,
            horizon,
            contributing_factors: Vec::new(),
            model_metadata,
            outcome: None,
        }
    }

    pub fn with_factor(mut self, factor: ContributingFactor) -> Self {
        self.contributing_factors.push(factor);
        self
    }

    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }
}
