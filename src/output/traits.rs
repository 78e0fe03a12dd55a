//! Record sink trait and associated types
//!
//! A sink receives the final records of a run (or of a utility command) in
//! stream order.

use crate::record::EnrichedRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while writing records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid import endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// What a sink accomplished
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkReport {
    /// Records accepted by the sink
    pub written: usize,

    /// 1-based numbers of batches the sink rejected
    pub failed_batches: Vec<usize>,
}

impl SinkReport {
    pub fn is_complete(&self) -> bool {
        self.failed_batches.is_empty()
    }
}

/// Trait for record sinks
///
/// Sinks preserve the order of `records`. Batch-level failures are reported
/// in the [`SinkReport`]; only failures that stop the sink entirely are
/// returned as errors.
#[async_trait]
pub trait RecordSink: Send {
    /// Writes every record
    ///
    /// # Arguments
    ///
    /// * `records` - Records in stream order
    async fn write_all(&mut self, records: &[EnrichedRecord]) -> SinkResult<SinkReport>;
}
