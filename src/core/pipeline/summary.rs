//! Batch summary and reporting
//!
//! This module defines structures for tracking and reporting batch results.

use crate::domain::AegisError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Summary of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// Number of requests in the batch
    pub total: usize,

    /// Number of requests that produced a resource
    pub successful: usize,

    /// Number of rejected requests
    pub failed: usize,

    /// Rejections per pipeline stage (`adapter`, `normalization`, ...)
    pub failures_by_stage: BTreeMap<String, usize>,

    /// Wall-clock duration of the batch in milliseconds
    pub duration_ms: u64,

    /// One entry per rejected request, in request order
    pub errors: Vec<BatchError>,
}

impl BatchSummary {
    /// Create a new empty batch summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Count a request that produced a resource
    pub fn record_success(&mut self) {
        self.total += 1;
        self.successful += 1;
    }

    /// Count a rejected request
    pub fn record_failure(&mut self, request_id: impl Into<String>, error: &AegisError) {
        self.total += 1;
        self.failed += 1;
        *self
            .failures_by_stage
            .entry(error.stage().to_string())
            .or_insert(0) += 1;
        self.errors.push(BatchError::new(request_id, error));
    }

    /// Check if every request succeeded
    pub fn is_successful(&self) -> bool {
        self.failed == 0 && self.errors.is_empty()
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.successful as f64 / self.total as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total = self.total,
            successful = self.successful,
            failed = self.failed,
            duration_ms = self.duration_ms,
            success_rate = format!("{:.2}%", self.success_rate()),
            "Batch completed"
        );

        if !self.errors.is_empty() {
            tracing::warn!(
                error_count = self.errors.len(),
                by_stage = ?self.failures_by_stage,
                "Batch completed with rejected requests"
            );
            for error in &self.errors {
                tracing::warn!(
                    request_id = %error.request_id,
                    stage = %error.stage,
                    message = %error.message,
                    "Batch request rejected"
                );
            }
        }
    }
}

/// A rejected batch request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchError {
    pub request_id: String,
    pub stage: String,
    pub message: String,
}

impl BatchError {
    pub fn new(request_id: impl Into<String>, error: &AegisError) -> Self {
        Self {
            request_id: request_id.into(),
            stage: error.stage().to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdapterError, BuildError, NormalizationError};

    #[test]
    fn test_summary_creation() {
        let summary = BatchSummary::new();
        assert_eq!(summary.total, 0);
        assert!(summary.is_successful());
        assert_eq!(summary.success_rate(), 100.0);
    }

    #[test]
    fn test_success_rate() {
        let mut summary = BatchSummary::new();
        for _ in 0..3 {
            summary.record_success();
        }
        summary.record_failure(
            "req-4",
            &AegisError::from(NormalizationError::MissingSubject {
                vendor: "epic".to_string(),
            }),
        );

        assert_eq!(summary.total, 4);
        assert_eq!(summary.success_rate(), 75.0);
        assert!(!summary.is_successful());
    }

    #[test]
    fn test_failures_by_stage() {
        let mut summary = BatchSummary::new();
        summary.record_failure(
            "a",
            &AegisError::from(AdapterError::UnsupportedVendor {
                vendor: "meditech".to_string(),
            }),
        );
        summary.record_failure(
            "b",
            &AegisError::from(BuildError::InvalidMethod {
                code: "random-forest".to_string(),
                allowed: "bert-clinical".to_string(),
            }),
        );
        summary.record_failure(
            "c",
            &AegisError::from(AdapterError::UnsupportedVendor {
                vendor: "allscripts".to_string(),
            }),
        );

        assert_eq!(summary.failures_by_stage.get("adapter"), Some(&2));
        assert_eq!(summary.failures_by_stage.get("build"), Some(&1));
        assert_eq!(summary.errors[1].request_id, "b");
        assert!(summary.errors[1].message.contains("random-forest"));
    }

    #[test]
    fn test_summary_serializes() {
        let summary = BatchSummary::new().with_duration(Duration::from_millis(1500));
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["duration_ms"], 1500);
        assert_eq!(value["errors"], serde_json::json!([]));
    }
}
