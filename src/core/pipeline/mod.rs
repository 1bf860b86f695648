//! Pipeline orchestration
//!
//! - [`coordinator`] - [`ForecastPipeline`], single and batch runs
//! - [`batch`] - Batch request and outcome types
//! - [`summary`] - Batch counters and error report

pub mod batch;
pub mod coordinator;
pub mod summary;

pub use batch::{BatchOutcome, BatchReport, BatchRequest};
pub use coordinator::{ForecastPipeline, DEFAULT_MAX_PARALLEL};
pub use summary::{BatchError, BatchSummary};
