//! Validate command implementation
//!
//! Checks a stored or externally produced `RiskAssessment` document against
//! the AegisHealthForecast profile and lists every violation.

use super::{EXIT_FATAL, EXIT_OK, EXIT_REJECTED};
use crate::core::fhir::validate_json;
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// RiskAssessment JSON document
    pub resource: PathBuf,
}

impl ValidateArgs {
    /// Execute the validate command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(resource = %self.resource.display(), "Validating resource");

        let content = match std::fs::read_to_string(&self.resource) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to read {}", self.resource.display());
                eprintln!("   Error: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        let value: Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("❌ {} is not valid JSON", self.resource.display());
                eprintln!("   Error: {e}");
                return Ok(EXIT_REJECTED);
            }
        };

        match validate_json(&value) {
            Ok(()) => {
                println!("✅ {} conforms to the AegisHealthForecast profile", self.resource.display());
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!(
                    "❌ {} has {} profile violation(s):",
                    self.resource.display(),
                    e.violations.len()
                );
                for violation in &e.violations {
                    println!("   - {violation}");
                }
                tracing::warn!(violations = e.violations.len(), "Resource failed validation");
                Ok(EXIT_REJECTED)
            }
        }
    }
}
