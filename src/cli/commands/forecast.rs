//! Forecast command implementation
//!
//! Runs one payload and one model result through the whole pipeline and
//! writes the resulting `RiskAssessment` JSON, or with `--bundle` a
//! transaction bundle that also carries the cited evidence.

use super::{exit_code, read_input, read_payload, report_error, resolve_config, EXIT_OK};
use crate::core::pipeline::ForecastPipeline;
use crate::domain::{AegisError, Result};
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the forecast command
#[derive(Args, Debug)]
pub struct ForecastArgs {
    /// Vendor id of the payload (epic, cerner, generic, hl7v2)
    #[arg(short, long)]
    pub vendor: String,

    /// Raw vendor payload file (JSON document or HL7 v2 message)
    #[arg(short, long)]
    pub payload: PathBuf,

    /// Forecast input JSON produced by the model
    #[arg(short, long)]
    pub input: PathBuf,

    /// Write the resource here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit a transaction bundle with the Patient, Conditions and Observations
    #[arg(long)]
    pub bundle: bool,
}

impl ForecastArgs {
    /// Execute the forecast command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        tracing::info!(
            vendor = %self.vendor,
            payload = %self.payload.display(),
            "Building forecast"
        );

        match self.run(config_path) {
            Ok(()) => Ok(EXIT_OK),
            Err(e) => {
                report_error(&e);
                Ok(exit_code(&e))
            }
        }
    }

    fn run(&self, config_path: Option<&str>) -> Result<()> {
        let config = resolve_config(config_path)?;
        let pipeline = ForecastPipeline::from_config(&config)?;

        let payload = read_payload(&self.payload)?;
        let input = read_input(&self.input)?;
        let (json, summary) = if self.bundle {
            let bundle = pipeline.run_bundle(&payload, &self.vendor, &input)?;
            let summary = format!("Bundle with {} entries", bundle.entry.len());
            (bundle.to_json()?, summary)
        } else {
            let resource = pipeline.run(&payload, &self.vendor, &input)?;
            (resource.to_json()?, format!("Forecast {}", resource.id()))
        };

        match &self.output {
            Some(path) => {
                write_output(path, &json)?;
                println!("✅ {summary} written to {}", path.display());
            }
            None => println!("{json}"),
        }
        Ok(())
    }
}

pub(crate) fn write_output(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .map_err(|e| AegisError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_forecast_writes_resource() {
        let dir = TempDir::new().unwrap();
        let payload = write(
            &dir,
            "payload.json",
            r#"{"PAT_MRN": "patient-123", "SNAPSHOT_TIME": "2024-03-01T10:00:00Z",
                "PROBLEM_LIST": [{"DX_CODE": "J45"}]}"#,
        );
        let input = write(
            &dir,
            "input.json",
            r#"{"method": "bert-clinical", "probability": 0.72,
                "horizon": {"value": 30, "unit": "d"},
                "model_metadata": {"model_name": "AegisBERT", "model_version": "1.2.0"}}"#,
        );
        let output = dir.path().join("resource.json");

        let args = ForecastArgs {
            vendor: "epic".to_string(),
            payload,
            input,
            output: Some(output.clone()),
            bundle: false,
        };
        let code = args.execute(Some("/nonexistent/aegis.toml")).await.unwrap();
        assert_eq!(code, super::super::EXIT_CONFIG);

        args.run(None).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(value["resourceType"], "RiskAssessment");
        assert_eq!(value["prediction"][0]["probabilityDecimal"], 0.72);
    }

    #[tokio::test]
    async fn test_forecast_rejects_unknown_method() {
        let dir = TempDir::new().unwrap();
        let payload = write(&dir, "payload.json", r#"{"PAT_MRN": "patient-123"}"#);
        let input = write(
            &dir,
            "input.json",
            r#"{"method": "random-forest", "probability": 0.5,
                "horizon": {"value": 7, "unit": "days"},
                "model_metadata": {"model_name": "m", "model_version": "1"}}"#,
        );

        let args = ForecastArgs {
            vendor: "epic".to_string(),
            payload,
            input,
            output: None,
            bundle: false,
        };
        let err = args.run(None).unwrap_err();
        assert_eq!(exit_code(&err), super::super::EXIT_REJECTED);
    }

    #[test]
    fn test_forecast_bundle_output() {
        let dir = TempDir::new().unwrap();
        let payload = write(
            &dir,
            "payload.json",
            r#"{"PAT_MRN": "patient-123", "SNAPSHOT_TIME": "2024-03-01T10:00:00Z",
                "PROBLEM_LIST": [{"DX_CODE": "J45"}]}"#,
        );
        let input = write(
            &dir,
            "input.json",
            r#"{"method": "bert-clinical", "probability": 0.72,
                "horizon": {"value": 30, "unit": "d"},
                "model_metadata": {"model_name": "AegisBERT", "model_version": "1.2.0"}}"#,
        );
        let output = dir.path().join("bundle.json");

        let args = ForecastArgs {
            vendor: "epic".to_string(),
            payload,
            input,
            output: Some(output.clone()),
            bundle: true,
        };
        args.run(None).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(value["resourceType"], "Bundle");
        assert_eq!(value["entry"][0]["resource"]["resourceType"], "Patient");
        assert_eq!(value["entry"][2]["resource"]["resourceType"], "RiskAssessment");
        assert_eq!(
            value["entry"][2]["resource"]["basis"][0]["reference"],
            value["entry"][1]["request"]["url"]
        );
    }
}
