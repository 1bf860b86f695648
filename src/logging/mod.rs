//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output with `RUST_LOG` filtering
//! - JSON-formatted file logs with rotation
//! - Helper macros for pipeline stage events
//!
//! # Example
//!
//! ```no_run
//! use aegis::logging::init_logging;
//! use aegis::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(vendor = "epic", "Payload received");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a request rejected by a pipeline stage
///
/// # Example
///
/// ```
/// use aegis::log_stage_failure;
/// use aegis::domain::{AdapterError, AegisError};
///
/// let error = AegisError::from(AdapterError::UnsupportedVendor {
///     vendor: "meditech".to_string(),
/// });
/// log_stage_failure!("meditech", &error);
/// ```
#[macro_export]
macro_rules! log_stage_failure {
    ($vendor:expr, $error:expr) => {
        tracing::warn!(
            vendor = %$vendor,
            stage = $error.stage(),
            error = %$error,
            "Forecast request rejected"
        )
    };
}

/// Log a built forecast resource
///
/// # Example
///
/// ```no_run
/// use aegis::log_forecast_built;
/// # fn example(resource: &aegis::core::fhir::ForecastResource) {
/// log_forecast_built!("epic", resource);
/// # }
/// ```
#[macro_export]
macro_rules! log_forecast_built {
    ($vendor:expr, $resource:expr) => {
        tracing::info!(
            vendor = %$vendor,
            subject = %$resource.subject(),
            resource_id = %$resource.id(),
            method = $resource.method().code(),
            probability = $resource.probability(),
            fingerprint = $resource.record_fingerprint(),
            "Forecast resource built"
        )
    };
}
