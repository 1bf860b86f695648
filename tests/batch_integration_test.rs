//! Batch mode: concurrent pipeline runs and the `batch` command

use aegis::adapters::RawPayload;
use aegis::cli::commands::batch::{BatchArgs, SUMMARY_FILE};
use aegis::core::pipeline::{BatchRequest, ForecastPipeline};
use aegis::domain::{ForecastHorizon, ForecastInput, ModelMetadata};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn request(id: &str, vendor: &str, subject: &str, method: &str) -> BatchRequest {
    BatchRequest::new(
        id,
        vendor,
        RawPayload::Json(json!({
            "PAT_MRN": subject,
            "SNAPSHOT_TIME": "2024-03-01T10:00:00Z",
            "PROBLEM_LIST": [{"DX_CODE": "J45"}]
        })),
        ForecastInput::new(
            method,
            0.5,
            ForecastHorizon::days(14),
            ModelMetadata::new("AegisEnsemble", "2.0.0"),
        ),
    )
}

#[tokio::test]
async fn test_batch_matches_sequential_runs() {
    let pipeline = ForecastPipeline::default().with_max_parallel(3);
    let requests: Vec<_> = (0..10)
        .map(|i| request(&format!("r{i}"), "epic", &format!("patient-{i}"), "ensemble"))
        .collect();

    let sequential: Vec<_> = requests
        .iter()
        .map(|r| pipeline.run(&r.payload, &r.vendor, &r.input).unwrap())
        .collect();
    let report = pipeline.run_batch(requests).await;

    assert!(report.summary.is_successful());
    assert_eq!(report.summary.total, 10);
    for (outcome, expected) in report.outcomes.iter().zip(&sequential) {
        assert_eq!(outcome.result.as_ref().unwrap(), expected);
    }
}

#[tokio::test]
async fn test_batch_isolates_failures() {
    let pipeline = ForecastPipeline::default();
    let report = pipeline
        .run_batch(vec![
            request("ok", "epic", "patient-1", "time-series"),
            request("bad-method", "epic", "patient-2", "random-forest"),
            request("bad-vendor", "allscripts", "patient-3", "ensemble"),
            request("no-subject", "epic", "", "ensemble"),
        ])
        .await;

    assert_eq!(report.summary.successful, 1);
    assert_eq!(report.summary.failed, 3);
    assert_eq!(report.summary.failures_by_stage.get("build"), Some(&1));
    assert_eq!(report.summary.failures_by_stage.get("adapter"), Some(&1));
    assert_eq!(report.summary.success_rate(), 25.0);

    let failed: Vec<_> = report
        .summary
        .errors
        .iter()
        .map(|e| e.request_id.as_str())
        .collect();
    assert_eq!(failed, vec!["bad-method", "bad-vendor", "no-subject"]);
}

#[tokio::test]
async fn test_batch_command_writes_outputs() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    fs::write(root.join("aegis.toml"), "[pipeline]\nmax_parallel = 2\n").unwrap();
    fs::write(
        root.join("p1.json"),
        r#"{"PAT_MRN": "patient-1", "SNAPSHOT_TIME": "2024-03-01T10:00:00Z", "PROBLEM_LIST": [{"DX_CODE": "J45"}]}"#,
    )
    .unwrap();
    fs::write(
        root.join("good.json"),
        r#"{"method": "bert-clinical", "probability": 0.9, "horizon": {"value": 30, "unit": "days"},
            "model_metadata": {"model_name": "AegisBERT", "model_version": "1.2.0"}}"#,
    )
    .unwrap();
    fs::write(
        root.join("bad.json"),
        r#"{"method": "bert-clinical", "probability": 1.5, "horizon": {"value": 30, "unit": "days"},
            "model_metadata": {"model_name": "AegisBERT", "model_version": "1.2.0"}}"#,
    )
    .unwrap();
    fs::write(
        root.join("manifest.json"),
        r#"{"requests": [
            {"id": "first", "vendor": "epic", "payload": "p1.json", "input": "good.json"},
            {"id": "second", "vendor": "epic", "payload": "p1.json", "input": "bad.json"}
        ]}"#,
    )
    .unwrap();

    let out = root.join("out");
    let args = BatchArgs {
        manifest: root.join("manifest.json"),
        output_dir: out.clone(),
        max_parallel: None,
    };
    let config = root.join("aegis.toml");
    let code = args.execute(config.to_str()).await.unwrap();

    assert_eq!(code, 1);
    assert!(out.join("first.json").exists());
    assert!(!out.join("second.json").exists());

    let summary: Value =
        serde_json::from_str(&fs::read_to_string(out.join(SUMMARY_FILE)).unwrap()).unwrap();
    assert_eq!(summary["successful"], 1);
    assert_eq!(summary["failed"], 1);
    assert_eq!(summary["errors"][0]["request_id"], "second");
    assert_eq!(summary["errors"][0]["stage"], "build");
}

#[tokio::test]
async fn test_batch_command_bad_manifest() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("aegis.toml"), "").unwrap();
    fs::write(dir.path().join("manifest.json"), "{\"requests\": 3}").unwrap();

    let args = BatchArgs {
        manifest: dir.path().join("manifest.json"),
        output_dir: dir.path().join("out"),
        max_parallel: Some(1),
    };
    let config = dir.path().join("aegis.toml");
    assert_eq!(args.execute(config.to_str()).await.unwrap(), 1);
}
