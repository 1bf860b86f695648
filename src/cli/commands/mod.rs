//! CLI command implementations
//!
//! Every command returns its process exit code:
//! `0` success, `1` rejected input or profile violations, `2` configuration
//! error, `5` fatal error.

pub mod batch;
pub mod forecast;
pub mod init;
pub mod normalize;
pub mod validate;
pub mod validate_config;

use crate::adapters::RawPayload;
use crate::config::{load_config, AegisConfig, LoggingConfig};
use crate::domain::{AegisError, BuildError, ForecastInput, Result, Violation};
use std::path::Path;

/// Configuration file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "aegis.toml";

/// Log level used when neither `--log-level` nor a configuration sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Success
pub const EXIT_OK: i32 = 0;
/// Rejected input, profile violations or failed batch requests
pub const EXIT_REJECTED: i32 = 1;
/// Configuration error
pub const EXIT_CONFIG: i32 = 2;
/// Fatal error
pub const EXIT_FATAL: i32 = 5;

/// Loads the configuration named on the command line
///
/// Without an explicit path, `aegis.toml` is read when present and built-in
/// defaults are used otherwise.
pub fn resolve_config(path: Option<&str>) -> Result<AegisConfig> {
    match path {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(DEFAULT_CONFIG_PATH),
        None => {
            tracing::debug!("No configuration file, using built-in defaults");
            Ok(AegisConfig::default())
        }
    }
}

/// Log level and file-logging settings for the process
///
/// `--log-level` wins over `[application].log_level`. A configuration that
/// cannot be loaded falls back to console logging; the command itself then
/// reports the configuration error.
pub fn logging_settings(
    cli_level: Option<&str>,
    config_path: Option<&str>,
) -> (String, LoggingConfig) {
    match resolve_config(config_path) {
        Ok(config) => (
            cli_level.map_or(config.application.log_level, str::to_string),
            config.logging,
        ),
        Err(_) => (
            cli_level.unwrap_or(DEFAULT_LOG_LEVEL).to_string(),
            LoggingConfig::default(),
        ),
    }
}

/// Maps an error to its exit code
pub fn exit_code(error: &AegisError) -> i32 {
    match error {
        AegisError::Configuration(_) => EXIT_CONFIG,
        AegisError::Io(_) => EXIT_FATAL,
        _ => EXIT_REJECTED,
    }
}

/// Prints an error to stderr, listing every profile violation it carries
pub fn report_error(error: &AegisError) {
    eprintln!("❌ {} stage rejected the request", error.stage());
    eprintln!("   Error: {error}");

    let violations: &[Violation] = match error {
        AegisError::Validation(e) | AegisError::Build(BuildError::Validation(e)) => &e.violations,
        _ => &[],
    };
    for violation in violations {
        eprintln!("   - {violation}");
    }
}

/// Reads a vendor payload file
pub fn read_payload(path: &Path) -> Result<RawPayload> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AegisError::Io(format!("Failed to read payload {}: {}", path.display(), e))
    })?;
    Ok(RawPayload::from_content(&content))
}

/// Reads a forecast input JSON file
pub fn read_input(path: &Path) -> Result<ForecastInput> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AegisError::Io(format!("Failed to read forecast input {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        AegisError::Serialization(format!(
            "Invalid forecast input {}: {}",
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NormalizationError, ValidationError, ViolationKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&AegisError::Configuration("x".into())), EXIT_CONFIG);
        assert_eq!(exit_code(&AegisError::Io("x".into())), EXIT_FATAL);
        assert_eq!(
            exit_code(&AegisError::from(NormalizationError::MissingSubject {
                vendor: "epic".into()
            })),
            EXIT_REJECTED
        );
        assert_eq!(
            exit_code(&AegisError::from(ValidationError::new(vec![Violation::new(
                "RiskAssessment.status",
                ViolationKind::MissingRequired,
                "status is required"
            )]))),
            EXIT_REJECTED
        );
    }

    #[test]
    fn test_resolve_explicit_missing_config() {
        let err = resolve_config(Some("/nonexistent/aegis.toml")).unwrap_err();
        assert_eq!(exit_code(&err), EXIT_CONFIG);
    }

    #[test]
    fn test_read_input() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"method": "ensemble", "probability": 0.4,
                "horizon": {{"value": 90, "unit": "days"}},
                "modelMetadata": {{"modelName": "AegisEnsemble", "modelVersion": "2.0"}}}}"#
        )
        .unwrap();

        let input = read_input(file.path()).unwrap();
        assert_eq!(input.method, "ensemble");
        assert_eq!(input.horizon.value, 90);
        assert_eq!(input.model_metadata.model_version, "2.0");
    }

    #[test]
    fn test_read_input_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = read_input(file.path()).unwrap_err();
        assert_eq!(exit_code(&err), EXIT_REJECTED);
    }

    #[test]
    fn test_read_payload_missing_file() {
        let err = read_payload(Path::new("/nonexistent/payload.json")).unwrap_err();
        assert_eq!(exit_code(&err), EXIT_FATAL);
    }

    #[test]
    fn test_logging_settings_precedence() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "[application]\nlog_level = \"warn\"\n\n[logging]\nlocal_rotation = \"hourly\"\n"
        )
        .unwrap();
        let path = file.path().to_str();

        let (level, logging) = logging_settings(None, path);
        assert_eq!(level, "warn");
        assert_eq!(logging.local_rotation, "hourly");

        let (level, _) = logging_settings(Some("debug"), path);
        assert_eq!(level, "debug");
    }

    #[test]
    fn test_logging_settings_without_usable_config() {
        let (level, logging) = logging_settings(None, Some("/nonexistent/aegis.toml"));
        assert_eq!(level, DEFAULT_LOG_LEVEL);
        assert!(!logging.local_enabled);
    }
}
