//! Pipeline coordinator
//!
//! Composes the adapter registry, the normalizer and the resource builder.
//! Every component is immutable after construction, so one pipeline is
//! cloned freely into concurrent batch workers.

use super::batch::{BatchOutcome, BatchReport, BatchRequest};
use crate::adapters::{AdapterRegistry, RawPayload};
use crate::config::AegisConfig;
use crate::core::fhir::{forecast_bundle, Bundle, ForecastBuilder, ForecastResource};
use crate::core::normalize::Normalizer;
use crate::domain::{AegisError, AttributeBag, ForecastInput, Result, UdmRecord};
use crate::{log_forecast_built, log_stage_failure};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::task::JoinError;
use std::time::Instant;

/// Default number of concurrently processed batch requests
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Adapter -> normalizer -> builder
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    registry: Arc<AdapterRegistry>,
    normalizer: Arc<Normalizer>,
    builder: Arc<ForecastBuilder>,
    max_parallel: usize,
}

impl ForecastPipeline {
    pub fn new(registry: AdapterRegistry, normalizer: Normalizer, builder: ForecastBuilder) -> Self {
        Self {
            registry: Arc::new(registry),
            normalizer: Arc::new(normalizer),
            builder: Arc::new(builder),
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }

    /// Builds every policy table from configuration
    ///
    /// # Errors
    ///
    /// Returns `AegisError::Configuration` for an unknown vendor, an invalid
    /// table entry or an invalid source offset
    pub fn from_config(config: &AegisConfig) -> Result<Self> {
        let registry = AdapterRegistry::from_config(&config.vendors)?;
        let normalizer = Normalizer::from_config(config)?;
        let builder = ForecastBuilder::from_config(&config.pipeline);

        tracing::debug!(
            vendors = ?registry.vendors(),
            max_parallel = config.pipeline.max_parallel,
            "Forecast pipeline initialized"
        );

        Ok(Self::new(registry, normalizer, builder).with_max_parallel(config.pipeline.max_parallel))
    }

    /// Sets batch concurrency; values below 1 are raised to 1
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn builder(&self) -> &ForecastBuilder {
        &self.builder
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Vendor payload to attribute bag
    pub fn adapt(&self, payload: &RawPayload, vendor: &str) -> Result<AttributeBag> {
        Ok(self.registry.adapt(payload, vendor)?)
    }

    /// Vendor payload to UDM record, without building a forecast
    pub fn normalize(&self, payload: &RawPayload, vendor: &str) -> Result<UdmRecord> {
        self.normalize_inner(payload, vendor)
            .inspect_err(|e| log_stage_failure!(vendor, e))
    }

    /// UDM record plus forecast input to a validated resource
    pub fn build(&self, record: &UdmRecord, input: &ForecastInput) -> Result<ForecastResource> {
        self.builder.build(record, input)
    }

    /// Runs one request through every stage
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that rejects the request; no
    /// partial resource is ever returned
    pub fn run(
        &self,
        payload: &RawPayload,
        vendor: &str,
        input: &ForecastInput,
    ) -> Result<ForecastResource> {
        let result = self
            .normalize_inner(payload, vendor)
            .and_then(|record| self.builder.build(&record, input));

        match &result {
            Ok(resource) => log_forecast_built!(vendor, resource),
            Err(e) => log_stage_failure!(vendor, e),
        }
        result
    }

    /// Runs one request and bundles the forecast with its evidence resources
    pub fn run_bundle(
        &self,
        payload: &RawPayload,
        vendor: &str,
        input: &ForecastInput,
    ) -> Result<Bundle> {
        let result = self.normalize_inner(payload, vendor).and_then(|record| {
            let resource = self.builder.build(&record, input)?;
            log_forecast_built!(vendor, resource);
            forecast_bundle(&record, &resource)
        });
        result.inspect_err(|e| log_stage_failure!(vendor, e))
    }

    /// Runs many requests on blocking workers, at most `max_parallel` at a time
    ///
    /// Outcomes are returned in request order. A failed request never stops
    /// the rest of the batch.
    pub async fn run_batch(&self, requests: Vec<BatchRequest>) -> BatchReport {
        let start = Instant::now();
        tracing::info!(
            requests = requests.len(),
            max_parallel = self.max_parallel,
            "Starting batch"
        );

        let outcomes: Vec<BatchOutcome> = stream::iter(requests.into_iter().map(|request| {
            let pipeline = self.clone();
            async move {
                let id = request.id.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    pipeline.run(&request.payload, &request.vendor, &request.input)
                })
                .await;
                BatchOutcome {
                    id,
                    result: worker_result(joined),
                }
            }
        }))
        .buffered(self.max_parallel)
        .collect()
        .await;

        let mut report = BatchReport::from_outcomes(outcomes);
        report.summary = report.summary.with_duration(start.elapsed());
        report.summary.log_summary();
        report
    }

    fn normalize_inner(&self, payload: &RawPayload, vendor: &str) -> Result<UdmRecord> {
        let bag = self.registry.adapt(payload, vendor)?;
        let record = self.normalizer.normalize(&bag)?;
        tracing::debug!(
            vendor = %vendor,
            subject = %record.subject(),
            observations = record.observations().len(),
            conditions = record.conditions().len(),
            medications = record.medications().len(),
            environment = record.environment().len(),
            "Payload normalized"
        );
        Ok(record)
    }
}

/// A worker that panicked or was cancelled fails only its own request
fn worker_result(
    joined: std::result::Result<Result<ForecastResource>, JoinError>,
) -> Result<ForecastResource> {
    joined.unwrap_or_else(|e| Err(AegisError::Io(format!("Batch worker failed: {e}"))))
}

impl Default for ForecastPipeline {
    fn default() -> Self {
        Self::new(
            AdapterRegistry::with_builtin(),
            Normalizer::default(),
            ForecastBuilder::default(),
        )
    }
}
