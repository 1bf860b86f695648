//! Normalize command implementation

use super::{exit_code, read_payload, report_error, resolve_config, EXIT_OK};
use crate::core::pipeline::ForecastPipeline;
use crate::domain::Result;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the normalize command
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Vendor id of the payload (epic, cerner, generic, hl7v2)
    #[arg(short, long)]
    pub vendor: String,

    /// Raw vendor payload file (JSON document or HL7 v2 message)
    #[arg(short, long)]
    pub payload: PathBuf,

    /// Also print the record fingerprint to stderr
    #[arg(long)]
    pub fingerprint: bool,
}

impl NormalizeArgs {
    /// Execute the normalize command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        tracing::info!(vendor = %self.vendor, payload = %self.payload.display(), "Normalizing payload");

        match self.run(config_path) {
            Ok(json) => {
                println!("{json}");
                Ok(EXIT_OK)
            }
            Err(e) => {
                report_error(&e);
                Ok(exit_code(&e))
            }
        }
    }

    fn run(&self, config_path: Option<&str>) -> Result<String> {
        let config = resolve_config(config_path)?;
        let pipeline = ForecastPipeline::from_config(&config)?;

        let payload = read_payload(&self.payload)?;
        let record = pipeline.normalize(&payload, &self.vendor)?;
        if self.fingerprint {
            eprintln!("fingerprint: {}", record.fingerprint()?);
        }
        Ok(serde_json::to_string_pretty(&record)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_hl7v2_message() {
        let dir = TempDir::new().unwrap();
        let payload = dir.path().join("message.hl7");
        std::fs::write(
            &payload,
            "MSH|^~\\&|LAB|HOSP|||20240301103000||ORU^R01|1|P|2.5\rPID|1||patient-123",
        )
        .unwrap();

        let args = NormalizeArgs {
            vendor: "hl7v2".to_string(),
            payload,
            fingerprint: false,
        };
        let json = args.run(None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["subject"], "patient-123");
        assert_eq!(value["source_vendor"], "hl7v2");
    }
}
