//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Aegis configuration file and the policy tables built from it.

use super::{DEFAULT_CONFIG_PATH, EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use crate::core::pipeline::ForecastPipeline;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateConfigArgs {}

impl ValidateConfigArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        let config_path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates every section
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        // Local code targets and unit rules are only checked when the tables are built
        let pipeline = match ForecastPipeline::from_config(&config) {
            Ok(p) => p,
            Err(e) => {
                println!("❌ Policy tables could not be built");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Source UTC Offset: {}", config.pipeline.source_utc_offset);
        println!("  Max Parallel: {}", pipeline.max_parallel());
        println!("  Default Outcome: {}", config.pipeline.default_outcome);
        println!("  Vendors: {}", pipeline.registry().vendors().join(", "));
        println!("  Terminology Fallback: {:?}", config.terminology.fallback);
        println!("  Local Codes: {}", config.terminology.local_codes.len());
        println!("  Unit Rules: {}", pipeline.normalizer().units().len());
        println!();
        Ok(EXIT_OK)
    }
}
