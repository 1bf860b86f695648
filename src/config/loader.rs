//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{AegisConfig, FallbackPolicy};
use crate::domain::errors::AegisError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into AegisConfig
/// 4. Applies environment variable overrides (AEGIS_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns `AegisError::Configuration` if the file is missing or unreadable,
/// a referenced environment variable is unset, the TOML is invalid, an
/// override cannot be parsed, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use aegis::config::loader::load_config;
///
/// let config = load_config("aegis.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<AegisConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(AegisError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        AegisError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text, applying the same substitution,
/// overrides and validation as [`load_config`]
pub fn parse_config(contents: &str) -> Result<AegisConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: AegisConfig = toml::from_str(&contents)
        .map_err(|e| AegisError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        AegisError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| AegisError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(AegisError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        AegisError::Configuration(format!("Invalid value '{value}' for {name}: {e}"))
    })
}

/// Applies environment variable overrides using AEGIS_* prefix
///
/// Environment variables follow the pattern: AEGIS_<SECTION>_<KEY>
/// For example: AEGIS_PIPELINE_MAX_PARALLEL, AEGIS_TERMINOLOGY_FALLBACK
fn apply_env_overrides(config: &mut AegisConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("AEGIS_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Pipeline overrides
    if let Ok(val) = std::env::var("AEGIS_PIPELINE_SOURCE_UTC_OFFSET") {
        config.pipeline.source_utc_offset = val;
    }
    if let Ok(val) = std::env::var("AEGIS_PIPELINE_MAX_PARALLEL") {
        config.pipeline.max_parallel = parse_override("AEGIS_PIPELINE_MAX_PARALLEL", &val)?;
    }
    if let Ok(val) = std::env::var("AEGIS_PIPELINE_DEFAULT_OUTCOME") {
        config.pipeline.default_outcome = val;
    }

    // Terminology overrides
    if let Ok(val) = std::env::var("AEGIS_TERMINOLOGY_FALLBACK") {
        config.terminology.fallback =
            parse_override::<FallbackPolicy>("AEGIS_TERMINOLOGY_FALLBACK", &val)?;
    }
    if let Ok(val) = std::env::var("AEGIS_TERMINOLOGY_CROSS_MAP_CONDITIONS_TO_SNOMED") {
        config.terminology.cross_map_conditions_to_snomed =
            parse_override("AEGIS_TERMINOLOGY_CROSS_MAP_CONDITIONS_TO_SNOMED", &val)?;
    }

    // Vendor overrides (comma-separated)
    if let Ok(val) = std::env::var("AEGIS_VENDORS_ENABLED") {
        config.vendors.enabled = val
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
    }

    // Logging overrides
    if let Ok(val) = std::env::var("AEGIS_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("AEGIS_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("AEGIS_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("AEGIS_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
