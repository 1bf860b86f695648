//! AegisHealthForecast profile identifiers
//!
//! Canonical URLs of the profile, its two extensions, and the forecast-method
//! code system. These are the only values a conforming resource may use.

/// Canonical base of every Aegis conformance resource
pub const CANONICAL_BASE: &str = "http://aegis-health.org/fhir";

/// Profile claimed in `meta.profile`
pub const PROFILE_URL: &str = "http://aegis-health.org/fhir/StructureDefinition/AegisHealthForecast";

/// Parent resource type
pub const RESOURCE_TYPE: &str = "RiskAssessment";

/// `forecastHorizon` extension (valueDuration, 1..1)
pub const FORECAST_HORIZON_URL: &str =
    "http://aegis-health.org/fhir/StructureDefinition/forecast-horizon";

/// `modelMetadata` extension (nested, 1..1)
pub const MODEL_METADATA_URL: &str =
    "http://aegis-health.org/fhir/StructureDefinition/model-metadata";

/// Closed, case-sensitive forecast-method code system
pub const FORECAST_METHOD_SYSTEM: &str =
    "http://aegis-health.org/fhir/CodeSystem/forecast-methods";

/// Sub-extension urls inside `modelMetadata`
pub const MODEL_NAME: &str = "modelName";
pub const MODEL_VERSION: &str = "modelVersion";
pub const TRAINING_DATA: &str = "trainingData";
pub const CONFIDENCE_SCORE: &str = "confidenceScore";

/// UCUM code system for durations and quantities
pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";

/// RiskAssessment.status value set
pub const RISK_ASSESSMENT_STATUSES: [&str; 8] = [
    "registered",
    "preliminary",
    "final",
    "amended",
    "corrected",
    "cancelled",
    "entered-in-error",
    "unknown",
];

/// Status of every resource the builder emits
pub const DEFAULT_STATUS: &str = "final";

/// Cardinality of a profile element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    pub min: usize,
    pub max: usize,
}

impl Cardinality {
    pub const EXACTLY_ONE: Cardinality = Cardinality { min: 1, max: 1 };
    pub const AT_MOST_ONE: Cardinality = Cardinality { min: 0, max: 1 };

    pub fn admits(&self, count: usize) -> bool {
        count >= self.min && count <= self.max
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

/// Declared cardinality of each `modelMetadata` sub-extension
pub const MODEL_METADATA_SLICES: [(&str, Cardinality); 4] = [
    (MODEL_NAME, Cardinality::EXACTLY_ONE),
    (MODEL_VERSION, Cardinality::EXACTLY_ONE),
    (TRAINING_DATA, Cardinality::AT_MOST_ONE),
    (CONFIDENCE_SCORE, Cardinality::AT_MOST_ONE),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_share_canonical_base() {
        for url in [
            PROFILE_URL,
            FORECAST_HORIZON_URL,
            MODEL_METADATA_URL,
            FORECAST_METHOD_SYSTEM,
        ] {
            assert!(url.starts_with(CANONICAL_BASE), "{url}");
        }
    }

    #[test]
    fn test_cardinality() {
        assert!(Cardinality::EXACTLY_ONE.admits(1));
        assert!(!Cardinality::EXACTLY_ONE.admits(0));
        assert!(!Cardinality::EXACTLY_ONE.admits(2));
        assert!(Cardinality::AT_MOST_ONE.admits(0));
        assert!(!Cardinality::AT_MOST_ONE.admits(2));
        assert_eq!(Cardinality::EXACTLY_ONE.to_string(), "1..1");
    }
}
