// Aegis - Vendor EHR data to health-forecast FHIR resources
// Copyright (c) 2025 Aegis Contributors
// Licensed under the MIT License

use aegis::cli::commands::{logging_settings, EXIT_CONFIG, EXIT_FATAL};
use aegis::cli::{Cli, Commands};
use aegis::logging::init_logging;
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Console on stderr, plus the JSON file layer when [logging] enables it
    let (log_level, logging) = logging_settings(cli.log_level.as_deref(), cli.config.as_deref());
    let guard = match init_logging(&log_level, &logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_CONFIG);
        }
    };

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Aegis starting");

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    // Flush buffered file events; process::exit skips destructors
    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    let config = cli.config.as_deref();
    match &cli.command {
        Commands::Forecast(args) => args.execute(config).await,
        Commands::Normalize(args) => args.execute(config).await,
        Commands::Validate(args) => args.execute().await,
        Commands::Batch(args) => args.execute(config).await,
        Commands::ValidateConfig(args) => args.execute(config).await,
        Commands::Init(args) => args.execute().await,
    }
}
