//! Batch request and result types

use super::summary::BatchSummary;
use crate::adapters::RawPayload;
use crate::core::fhir::ForecastResource;
use crate::domain::{ForecastInput, Result};

/// One forecast request in a batch
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Caller-chosen identifier, echoed in the outcome and in error reports
    pub id: String,
    pub vendor: String,
    pub payload: RawPayload,
    pub input: ForecastInput,
}

impl BatchRequest {
    pub fn new(
        id: impl Into<String>,
        vendor: impl Into<String>,
        payload: RawPayload,
        input: ForecastInput,
    ) -> Self {
        Self {
            id: id.into(),
            vendor: vendor.into(),
            payload,
            input,
        }
    }
}

/// Result of a single batch request
#[derive(Debug)]
pub struct BatchOutcome {
    pub id: String,
    pub result: Result<ForecastResource>,
}

/// Outcomes in request order, plus the aggregate summary
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Builds the report, deriving the summary counters from the outcomes
    pub(crate) fn from_outcomes(outcomes: Vec<BatchOutcome>) -> Self {
        let mut summary = BatchSummary::new();
        for outcome in &outcomes {
            match &outcome.result {
                Ok(_) => summary.record_success(),
                Err(e) => summary.record_failure(outcome.id.as_str(), e),
            }
        }
        Self { outcomes, summary }
    }

    /// Successfully built resources, in request order
    pub fn resources(&self) -> impl Iterator<Item = (&str, &ForecastResource)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|r| (o.id.as_str(), r)))
    }
}
