//! Domain models and types for Aegis.
//!
//! This module contains the types every pipeline stage exchanges: the vendor
//! attribute bag, the Unified Data Model, the externally supplied forecast
//! input, profile violations, and the error hierarchy.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`SubjectId`], [`VendorId`])
//! - **Pipeline data** ([`AttributeBag`], [`UdmRecord`], [`ForecastInput`])
//! - **Error types** ([`AegisError`], [`AdapterError`], [`NormalizationError`],
//!   [`BuildError`], [`ValidationError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! Stage errors convert into [`AegisError`] with the `?` operator:
//!
//! ```rust
//! use aegis::domain::{AegisError, Result, SubjectId};
//!
//! fn subject(raw: &str) -> Result<SubjectId> {
//!     SubjectId::new(raw).map_err(AegisError::Configuration)
//! }
//!
//! assert!(subject("patient-123").is_ok());
//! assert!(subject("").is_err());
//! ```

pub mod attribute_bag;
pub mod errors;
pub mod forecast;
pub mod ids;
pub mod result;
pub mod udm;
pub mod violation;

// Re-export commonly used types for convenience
pub use attribute_bag::{keys, Attributes, AttributeBag, BagEntry, RawValue, Section};
pub use errors::{AdapterError, AegisError, BuildError, NormalizationError, ValidationError};
pub use forecast::{
    ContributingFactor, ForecastHorizon, ForecastInput, ForecastMethod, HorizonUnit, ModelMetadata,
};
pub use ids::{SubjectId, VendorId};
pub use result::Result;
pub use udm::{
    AdministrativeGender, Coding, Condition, Demographics, EnvironmentalReading,
    MedicationStatement, MedicationStatus, Observation, Period, TerminologySystem, UdmRecord,
};
pub use violation::{Violation, ViolationKind};
