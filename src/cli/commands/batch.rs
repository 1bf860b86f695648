//! Batch command implementation
//!
//! Reads a JSON manifest of requests, runs them concurrently and writes one
//! resource file per successful request plus `summary.json`.
//!
//! ```json
//! {
//!   "requests": [
//!     {"id": "p123", "vendor": "epic", "payload": "p123.json", "input": "p123-model.json"}
//!   ]
//! }
//! ```
//!
//! Payload and input paths are resolved against the manifest's directory.

use super::forecast::write_output;
use super::{
    exit_code, read_input, read_payload, report_error, resolve_config, EXIT_OK, EXIT_REJECTED,
};
use crate::core::pipeline::{BatchReport, BatchRequest, ForecastPipeline};
use crate::domain::{AegisError, Result};
use clap::Args;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name of the batch summary in the output directory
pub const SUMMARY_FILE: &str = "summary.json";

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Batch manifest (JSON)
    #[arg(short, long)]
    pub manifest: PathBuf,

    /// Directory receiving `<id>.json` resources and `summary.json`
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Override pipeline.max_parallel
    #[arg(long)]
    pub max_parallel: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    requests: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    id: String,
    vendor: String,
    payload: PathBuf,
    input: PathBuf,
}

impl BatchArgs {
    /// Execute the batch command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        tracing::info!(
            manifest = %self.manifest.display(),
            output_dir = %self.output_dir.display(),
            "Running batch"
        );

        match self.run(config_path).await {
            Ok(report) => {
                let summary = &report.summary;
                println!(
                    "📊 Batch finished: {} succeeded, {} failed ({:.2}%)",
                    summary.successful,
                    summary.failed,
                    summary.success_rate()
                );
                for error in &summary.errors {
                    println!("   ❌ {} [{}]: {}", error.request_id, error.stage, error.message);
                }
                Ok(if summary.is_successful() {
                    EXIT_OK
                } else {
                    EXIT_REJECTED
                })
            }
            Err(e) => {
                report_error(&e);
                Ok(exit_code(&e))
            }
        }
    }

    async fn run(&self, config_path: Option<&str>) -> Result<BatchReport> {
        let config = resolve_config(config_path)?;
        let mut pipeline = ForecastPipeline::from_config(&config)?;
        if let Some(max_parallel) = self.max_parallel {
            pipeline = pipeline.with_max_parallel(max_parallel);
        }

        let requests = load_manifest(&self.manifest)?;
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            AegisError::Io(format!(
                "Failed to create output directory {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;

        let report = pipeline.run_batch(requests).await;

        for (id, resource) in report.resources() {
            write_output(&self.output_dir.join(format!("{id}.json")), &resource.to_json()?)?;
        }
        write_output(
            &self.output_dir.join(SUMMARY_FILE),
            &serde_json::to_string_pretty(&report.summary)?,
        )?;

        Ok(report)
    }
}

/// Reads a manifest and every file it references
///
/// # Errors
///
/// Unreadable files are `Io`; a malformed manifest, a missing or unparsable
/// forecast input, or a duplicate or unsafe request id is `Serialization`
fn load_manifest(path: &Path) -> Result<Vec<BatchRequest>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AegisError::Io(format!("Failed to read manifest {}: {}", path.display(), e))
    })?;
    let manifest: Manifest = serde_json::from_str(&content).map_err(|e| {
        AegisError::Serialization(format!("Invalid manifest {}: {}", path.display(), e))
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut seen = HashSet::new();
    let mut requests = Vec::with_capacity(manifest.requests.len());

    for entry in manifest.requests {
        check_request_id(&entry.id)?;
        if !seen.insert(entry.id.clone()) {
            return Err(AegisError::Serialization(format!(
                "Duplicate request id '{}' in manifest",
                entry.id
            )));
        }

        let payload = read_payload(&base.join(&entry.payload))?;
        let input = read_input(&base.join(&entry.input))?;
        requests.push(BatchRequest::new(entry.id, entry.vendor, payload, input));
    }

    tracing::debug!(requests = requests.len(), "Manifest loaded");
    Ok(requests)
}

/// Request ids become file names in the output directory
fn check_request_id(id: &str) -> Result<()> {
    let safe = !id.is_empty()
        && id != "summary"
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if safe {
        Ok(())
    } else {
        Err(AegisError::Serialization(format!(
            "Invalid request id '{id}': use letters, digits, '-', '_' or '.'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_request_id() {
        assert!(check_request_id("patient-123_v2.0").is_ok());
        assert!(check_request_id("").is_err());
        assert!(check_request_id("summary").is_err());
        assert!(check_request_id("../escape").is_err());
        assert!(check_request_id("a/b").is_err());
    }

    #[test]
    fn test_load_manifest_duplicate_id() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("p.json"), r#"{"PAT_MRN": "p1"}"#).unwrap();
        std::fs::write(
            dir.path().join("i.json"),
            r#"{"method": "ensemble", "probability": 0.1,
                "horizon": {"value": 1, "unit": "wk"},
                "model_metadata": {"model_name": "m", "model_version": "1"}}"#,
        )
        .unwrap();
        let manifest = dir.path().join("batch.json");
        std::fs::write(
            &manifest,
            r#"{"requests": [
                {"id": "a", "vendor": "epic", "payload": "p.json", "input": "i.json"},
                {"id": "a", "vendor": "epic", "payload": "p.json", "input": "i.json"}
            ]}"#,
        )
        .unwrap();

        let err = load_manifest(&manifest).unwrap_err();
        assert!(err.to_string().contains("Duplicate request id 'a'"));
    }

    #[test]
    fn test_load_manifest_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("payloads")).unwrap();
        std::fs::write(
            dir.path().join("payloads").join("p.json"),
            r#"{"PAT_MRN": "p1"}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("i.json"),
            r#"{"method": "time-series", "probability": 0.2,
                "horizon": {"value": 6, "unit": "months"},
                "model_metadata": {"model_name": "m", "model_version": "1"}}"#,
        )
        .unwrap();
        let manifest = dir.path().join("batch.json");
        std::fs::write(
            &manifest,
            r#"{"requests": [{"id": "a", "vendor": "epic", "payload": "payloads/p.json", "input": "i.json"}]}"#,
        )
        .unwrap();

        let requests = load_manifest(&manifest).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].input.method, "time-series");
    }
}
