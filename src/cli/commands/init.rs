//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{DEFAULT_CONFIG_PATH, EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Aegis configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your vendor and terminology settings", self.output);
                println!("  2. Validate configuration: aegis validate-config");
                println!("  3. Build a forecast: aegis forecast --vendor epic --payload p.json --input i.json");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate the commented default configuration
    fn generate_config() -> String {
        r#"# Aegis Configuration File
# Vendor EHR payloads to AegisHealthForecast RiskAssessment resources
#
# Every setting below shows its default. Values may reference environment
# variables with ${VAR_NAME}, and AEGIS_<SECTION>_<KEY> variables override
# the file (e.g. AEGIS_PIPELINE_MAX_PARALLEL=8).

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Pipeline
# ============================================================================
[pipeline]
# UTC offset applied to vendor timestamps that carry no zone
source_utc_offset = "+00:00"

# Requests processed concurrently by `aegis batch` (1-256)
max_parallel = 4

# Prediction outcome text when the model result names none
default_outcome = "Adverse health event"

# ============================================================================
# Terminology
# ============================================================================
[terminology]
# reject | accept-declared-system
fallback = "reject"

# Re-code ICD-10 conditions to SNOMED CT where a cross-map exists
cross_map_conditions_to_snomed = false

# Vendor-local codes mapped onto a standard system
# [[terminology.local_codes]]
# vendor = "epic"        # omit to apply to every vendor
# code = "ASTH01"
# system = "icd10"       # icd10 | snomed | loinc | rxnorm | cpt | environmental
# target = "J45"
# display = "Asthma"

# Concepts added to the built-in catalogue
# [[terminology.concepts]]
# system = "loinc"
# code = "1988-5"
# display = "C reactive protein"

# ============================================================================
# Units
# ============================================================================
# Rules replace the built-in rule for the same code.
# canonical value = value * factor + offset
# [[units.rules]]
# code = "1988-5"
# canonical = "mg/L"
# accepted = [{ unit = "mg/dL", factor = 10.0 }]

# ============================================================================
# Vendors
# ============================================================================
[vendors]
enabled = ["epic", "cerner", "generic", "hl7v2"]

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log files in addition to console output
local_enabled = false
local_path = "./logs"

# daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}
