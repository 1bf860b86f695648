//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Aegis using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Aegis - vendor EHR data to validated health-forecast resources
#[derive(Parser, Debug)]
#[command(name = "aegis")]
#[command(version, about, long_about = None)]
#[command(author = "Aegis Contributors")]
pub struct Cli {
    /// Path to configuration file (built-in defaults when absent)
    #[arg(short, long, env = "AEGIS_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "AEGIS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a forecast resource from a vendor payload and a model result
    Forecast(commands::forecast::ForecastArgs),

    /// Normalize a vendor payload and print the UDM record
    Normalize(commands::normalize::NormalizeArgs),

    /// Check a RiskAssessment document against the forecast profile
    Validate(commands::validate::ValidateArgs),

    /// Run every request of a batch manifest
    Batch(commands::batch::BatchArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate_config::ValidateConfigArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
