//! Configuration schema types
//!
//! Every section has defaults, so an empty file is a valid configuration that
//! runs with the built-in policy tables only.

use crate::adapters::BUILTIN_VENDORS;
use crate::domain::{TerminologySystem, VendorId};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// Main Aegis configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AegisConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Pipeline behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Terminology mapping policy
    #[serde(default)]
    pub terminology: TerminologyConfig,

    /// Unit conversion policy
    #[serde(default)]
    pub units: UnitsConfig,

    /// Vendor adapter selection
    #[serde(default)]
    pub vendors: VendorsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AegisConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.pipeline.validate()?;
        self.terminology.validate()?;
        self.units.validate()?;
        self.vendors.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// UTC offset applied to source timestamps that carry none ("+00:00", "-05:00", "Z")
    #[serde(default = "default_source_utc_offset")]
    pub source_utc_offset: String,

    /// Maximum number of requests processed concurrently in batch mode
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Outcome text used when the forecast input names none
    #[serde(default = "default_outcome")]
    pub default_outcome: String,
}

impl PipelineConfig {
    /// Parses `source_utc_offset`
    pub fn utc_offset(&self) -> Result<FixedOffset, String> {
        let raw = self.source_utc_offset.trim();
        if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
            return FixedOffset::east_opt(0).ok_or_else(|| "invalid zero offset".to_string());
        }
        raw.parse::<FixedOffset>().map_err(|e| {
            format!("Invalid pipeline.source_utc_offset '{raw}': {e}. Expected e.g. '+00:00'")
        })
    }

    fn validate(&self) -> Result<(), String> {
        self.utc_offset()?;

        if self.max_parallel == 0 || self.max_parallel > 256 {
            return Err(format!(
                "pipeline.max_parallel must be between 1 and 256, got {}",
                self.max_parallel
            ));
        }

        if self.default_outcome.trim().is_empty() {
            return Err("pipeline.default_outcome cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_utc_offset: default_source_utc_offset(),
            max_parallel: default_max_parallel(),
            default_outcome: default_outcome(),
        }
    }
}

/// What to do with a code that has no known mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Fail with an unmappable-code error
    #[default]
    Reject,
    /// Keep the code verbatim when the record declares a recognised system
    AcceptDeclaredSystem,
}

impl std::str::FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "accept-declared-system" => Ok(Self::AcceptDeclaredSystem),
            other => Err(format!(
                "Invalid terminology fallback '{other}'. Must be one of: reject, accept-declared-system"
            )),
        }
    }
}

/// A vendor-local code mapped onto a declared terminology system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalCodeConfig {
    /// Vendor the mapping applies to; all vendors when absent
    #[serde(default)]
    pub vendor: Option<String>,

    /// Code as it appears in the vendor payload
    pub code: String,

    /// Target system key (icd10, snomed, loinc, rxnorm, cpt, environmental)
    pub system: String,

    /// Code in the target system
    pub target: String,

    #[serde(default)]
    pub display: Option<String>,
}

/// An additional known concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptConfig {
    pub system: String,
    pub code: String,
    pub display: String,
}

/// Terminology mapping configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerminologyConfig {
    #[serde(default)]
    pub fallback: FallbackPolicy,

    /// Re-code ICD-10 conditions to SNOMED CT where a cross-map exists
    #[serde(default)]
    pub cross_map_conditions_to_snomed: bool,

    #[serde(default)]
    pub local_codes: Vec<LocalCodeConfig>,

    #[serde(default)]
    pub concepts: Vec<ConceptConfig>,
}

impl TerminologyConfig {
    fn validate(&self) -> Result<(), String> {
        for (i, local) in self.local_codes.iter().enumerate() {
            if local.code.trim().is_empty() || local.target.trim().is_empty() {
                return Err(format!(
                    "terminology.local_codes[{i}]: code and target cannot be empty"
                ));
            }
            parse_system(&local.system)
                .map_err(|e| format!("terminology.local_codes[{i}]: {e}"))?;
            if let Some(vendor) = &local.vendor {
                VendorId::new(vendor.as_str())
                    .map_err(|e| format!("terminology.local_codes[{i}]: {e}"))?;
            }
        }

        for (i, concept) in self.concepts.iter().enumerate() {
            if concept.code.trim().is_empty() {
                return Err(format!("terminology.concepts[{i}]: code cannot be empty"));
            }
            parse_system(&concept.system).map_err(|e| format!("terminology.concepts[{i}]: {e}"))?;
        }

        Ok(())
    }
}

/// Accepted source unit and its linear conversion to the canonical unit
///
/// `canonical = value * factor + offset`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversionConfig {
    pub unit: String,
    #[serde(default = "default_factor")]
    pub factor: f64,
    #[serde(default)]
    pub offset: f64,
}

/// Canonical unit policy for one observation code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRuleConfig {
    pub code: String,
    pub canonical: String,
    #[serde(default)]
    pub accepted: Vec<UnitConversionConfig>,
}

/// Unit conversion configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitsConfig {
    #[serde(default)]
    pub rules: Vec<UnitRuleConfig>,
}

impl UnitsConfig {
    fn validate(&self) -> Result<(), String> {
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.code.trim().is_empty() || rule.canonical.trim().is_empty() {
                return Err(format!("units.rules[{i}]: code and canonical cannot be empty"));
            }
            for conversion in &rule.accepted {
                if !conversion.factor.is_finite() || conversion.factor == 0.0 {
                    return Err(format!(
                        "units.rules[{i}]: factor for '{}' must be finite and non-zero",
                        conversion.unit
                    ));
                }
                if !conversion.offset.is_finite() {
                    return Err(format!(
                        "units.rules[{i}]: offset for '{}' must be finite",
                        conversion.unit
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Vendor adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorsConfig {
    /// Vendor ids accepted by the adapter registry
    #[serde(default = "default_enabled_vendors")]
    pub enabled: Vec<String>,
}

impl VendorsConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled.is_empty() {
            return Err("vendors.enabled cannot be empty".to_string());
        }
        for vendor in &self.enabled {
            let id = VendorId::new(vendor.as_str())?;
            if !BUILTIN_VENDORS.contains(&id.as_str()) {
                return Err(format!(
                    "Unknown vendor '{}' in vendors.enabled. Must be one of: {}",
                    vendor,
                    BUILTIN_VENDORS.join(", ")
                ));
            }
        }
        Ok(())
    }
}

impl Default for VendorsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_vendors(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn parse_system(system: &str) -> Result<TerminologySystem, String> {
    system.parse::<TerminologySystem>()
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_source_utc_offset() -> String {
    "+00:00".to_string()
}

fn default_max_parallel() -> usize {
    4
}

fn default_outcome() -> String {
    crate::core::fhir::DEFAULT_OUTCOME.to_string()
}

fn default_factor() -> f64 {
    1.0
}

fn default_enabled_vendors() -> Vec<String> {
    BUILTIN_VENDORS.iter().map(|v| v.to_string()).collect()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
