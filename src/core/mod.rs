//! Core business logic for Aegis.
//!
//! This module contains the transformation stages and their orchestration.
//!
//! # Modules
//!
//! - [`normalize`] - Attribute bag to UDM record (terminology, units, timestamps)
//! - [`fhir`] - Forecast resource construction and profile validation
//! - [`pipeline`] - Adapter, normalizer, and builder composition; batch runs
//! - [`fingerprint`] - Canonical JSON and SHA-256 provenance fingerprints
//!
//! # Forecast Workflow
//!
//! 1. **Adapt**: the vendor adapter turns the raw payload into an attribute bag
//! 2. **Normalize**: the bag becomes an immutable UDM record
//! 3. **Build**: the record and the externally computed forecast become a
//!    `RiskAssessment` resource
//! 4. **Validate**: the resource is checked against the AegisHealthForecast
//!    profile before it is returned
//!
//! # Example
//!
//! ```rust
//! use aegis::adapters::RawPayload;
//! use aegis::config::AegisConfig;
//! use aegis::core::pipeline::ForecastPipeline;
//! use aegis::domain::{ForecastHorizon, ForecastInput, ModelMetadata};
//! use serde_json::json;
//!
//! let pipeline = ForecastPipeline::from_config(&AegisConfig::default()).unwrap();
//! let payload = RawPayload::Json(json!({
//!     "PAT_MRN": "patient-123",
//!     "SNAPSHOT_TIME": "2024-03-01T00:00:00Z",
//!     "PROBLEM_LIST": [{"DX_CODE": "J45"}]
//! }));
//! let input = ForecastInput::new(
//!     "bert-clinical",
//!     0.72,
//!     ForecastHorizon::days(30),
//!     ModelMetadata::new("AegisBERT", "1.2.0"),
//! );
//!
//! let resource = pipeline.run(&payload, "epic", &input).unwrap();
//! assert_eq!(resource.probability(), 0.72);
//! ```

pub mod fhir;
pub mod fingerprint;
pub mod normalize;
pub mod pipeline;
