//! FHIR forecast resources
//!
//! - [`profile`] - Canonical URLs and cardinalities of the AegisHealthForecast profile
//! - [`model`] - Wire serialization of `RiskAssessment`
//! - [`resource`] - The typed [`ForecastResource`]
//! - [`builder`] - UDM record + forecast input to resource
//! - [`bundle`] - Transaction bundle of a forecast and the evidence it cites
//! - [`validator`] - Profile conformance checks

pub mod builder;
pub mod bundle;
pub mod model;
pub mod profile;
pub mod resource;
pub mod validator;

pub use builder::{ForecastBuilder, DEFAULT_OUTCOME};
pub use bundle::{forecast_bundle, Bundle};
pub use model::{Extension, RiskAssessment};
pub use resource::ForecastResource;
pub use validator::{validate, validate_json};
