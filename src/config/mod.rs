//! Configuration management for Aegis.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation. Configuration is read once at process start and turned into
//! immutable policy tables shared by every pipeline run.
//!
//! # Overview
//!
//! Aegis uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `AEGIS_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use aegis::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("aegis.toml")?;
//! println!("Enabled vendors: {}", config.vendors.enabled.join(", "));
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`PipelineConfig`] - Source UTC offset, batch parallelism, default outcome
//! - [`TerminologyConfig`] - Fallback policy, local code mappings, extra concepts
//! - [`UnitsConfig`] - Extra unit conversion rules
//! - [`VendorsConfig`] - Enabled vendor adapters
//! - [`LoggingConfig`] - Local JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [pipeline]
//! source_utc_offset = "-05:00"
//! max_parallel = 8
//!
//! [terminology]
//! fallback = "reject"
//!
//! [[terminology.local_codes]]
//! vendor = "epic"
//! code = "ASTH01"
//! system = "icd10"
//! target = "J45"
//!
//! [vendors]
//! enabled = ["epic", "cerner", "hl7v2"]
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    AegisConfig, ApplicationConfig, ConceptConfig, FallbackPolicy, LocalCodeConfig, LoggingConfig,
    PipelineConfig, TerminologyConfig, UnitConversionConfig, UnitRuleConfig, UnitsConfig,
    VendorsConfig,
};
