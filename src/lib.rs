// Aegis - Vendor EHR data to health-forecast FHIR resources
// Copyright (c) 2025 Aegis Contributors
// Licensed under the MIT License

//! # Aegis - Vendor EHR data to health-forecast FHIR resources
//!
//! Aegis turns heterogeneous EHR vendor payloads into a vendor-neutral
//! Unified Data Model (UDM) and combines a UDM record with an externally
//! computed forecast into a `RiskAssessment` resource that conforms to the
//! `AegisHealthForecast` profile.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Adapting** Epic, Cerner, generic JSON and HL7 v2 payloads into attribute bags
//! - **Normalizing** codes, units and timestamps into a deterministic UDM record
//! - **Building** forecast resources from a UDM record and a model result
//! - **Validating** any `RiskAssessment` document against the profile, reporting
//!   every violation in one pass
//!
//! ## Architecture
//!
//! Aegis follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Normalization, FHIR construction and validation, pipeline orchestration
//! - [`adapters`] - Vendor payload adapters and their registry
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aegis::adapters::RawPayload;
//! use aegis::config::load_config;
//! use aegis::core::pipeline::ForecastPipeline;
//! use aegis::domain::{ForecastHorizon, ForecastInput, ModelMetadata};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("aegis.toml")?;
//! let pipeline = ForecastPipeline::from_config(&config)?;
//!
//! let payload = RawPayload::from_content(&std::fs::read_to_string("payload.json")?);
//! let input = ForecastInput::new(
//!     "bert-clinical",
//!     0.72,
//!     ForecastHorizon::days(30),
//!     ModelMetadata::new("AegisBERT", "1.2.0"),
//! );
//!
//! let resource = pipeline.run(&payload, "epic", &input)?;
//! println!("{}", resource.to_json()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every stage has its own error type; all of them convert into
//! [`domain::AegisError`], which names the stage that rejected a request:
//!
//! ```rust
//! use aegis::adapters::RawPayload;
//! use aegis::core::pipeline::ForecastPipeline;
//! use aegis::domain::{ForecastHorizon, ForecastInput, ModelMetadata};
//! use serde_json::json;
//!
//! let pipeline = ForecastPipeline::default();
//! let input = ForecastInput::new(
//!     "bert-clinical",
//!     1.5,
//!     ForecastHorizon::days(30),
//!     ModelMetadata::new("AegisBERT", "1.2.0"),
//! );
//! let payload = RawPayload::Json(json!({"PAT_MRN": "patient-123"}));
//!
//! let err = pipeline.run(&payload, "epic", &input).unwrap_err();
//! assert_eq!(err.stage(), "build");
//! ```
//!
//! ## Validation
//!
//! Stored or third-party documents are checked with the same validator the
//! builder runs on its own output:
//!
//! ```rust
//! use aegis::core::fhir::validate_json;
//! use serde_json::json;
//!
//! let err = validate_json(&json!({"resourceType": "RiskAssessment"})).unwrap_err();
//! assert!(err.violations.len() > 1);
//! ```
//!
//! ## Logging
//!
//! Aegis uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use aegis::config::LoggingConfig;
//! use aegis::logging::init_logging;
//!
//! let _guard = init_logging("debug", &LoggingConfig::default()).expect("logging");
//! tracing::info!(vendor = "epic", "Payload received");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
