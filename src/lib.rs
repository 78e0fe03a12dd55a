//! Catalog-Harvester: a polite product catalog harvester
//!
//! This crate walks a retailer's paginated, rate-limited product API, enriches
//! every listed item with its detail record, optionally reconciles the result
//! against a previous snapshot, and writes a JSON Lines record stream.

pub mod category;
pub mod config;
pub mod harvest;
pub mod output;
pub mod record;
pub mod snapshot;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Catalog-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Sink error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("No products found: first listing request failed ({label}): {source}")]
    FirstRequest { label: String, source: SliceError },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Required input file not found: {}", .0.display())]
    MissingInput(PathBuf),
}

/// Errors raised by the rate-limited fetcher
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("too many retries for {url}")]
    TooManyRetries {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Malformed lines or response bodies
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    Line { line: usize, message: String },

    #[error("unusable response body from {context}: {message}")]
    Body { context: String, message: String },
}

/// Failure of a single listing or detail slice
///
/// Slice failures are absorbed by the caller; only the very first listing
/// request escalates one into [`HarvestError::FirstRequest`].
#[derive(Debug, Error)]
pub enum SliceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Result type alias for Catalog-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvest::{Fetcher, HarvestOptions, RunReport};
pub use output::RunStats;
pub use record::{CatalogItem, Delta, EnrichedRecord, ReconciliationOutcome, RecordId};
