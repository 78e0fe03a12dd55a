//! Output module for writing records and run summaries
//!
//! This module handles:
//! - Writing the JSON Lines record stream
//! - Posting records to the downstream import endpoint
//! - Recording run statistics and printing the summary

mod import;
mod jsonl;
pub mod stats;
mod traits;

pub use import::ImportSink;
pub use jsonl::JsonlSink;
pub use stats::{print_summary, RunStats};
pub use traits::{RecordSink, SinkError, SinkReport, SinkResult};
