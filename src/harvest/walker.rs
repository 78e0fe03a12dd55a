//! Pagination walker
//!
//! A [`PageStrategy`] knows how to issue one listing request and where the
//! next one should go. The [`Walker`] drives a strategy to completion and owns
//! the concerns shared by every strategy: throttling, repeated-id removal,
//! the item cap and the first-request failure policy.

use crate::harvest::Fetcher;
use crate::output::RunStats;
use crate::record::{CatalogItem, RecordId};
use crate::{HarvestError, ParseError, Result, SliceError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

/// The result of one listing request
#[derive(Debug)]
pub struct Slice {
    /// Human-readable location of the request (page, department)
    pub label: String,
    pub items: Vec<CatalogItem>,
    /// Set when the request failed; `items` is then empty
    pub error: Option<SliceError>,
}

impl Slice {
    pub fn ok(label: String, items: Vec<CatalogItem>) -> Self {
        Self {
            label,
            items,
            error: None,
        }
    }

    pub fn failed(label: String, error: impl Into<SliceError>) -> Self {
        Self {
            label,
            items: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// One way of walking a paginated listing
///
/// Each strategy carries its own cursor type, so cursors of different
/// strategies cannot be mixed within one walk.
#[async_trait]
pub trait PageStrategy: Send + Sync {
    type Cursor: Send + Sync + std::fmt::Debug;

    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Cursor of the first request
    fn start(&self) -> Self::Cursor;

    /// Issues exactly one listing request
    ///
    /// Returns the slice and the cursor of the next request, or `None` when
    /// the walk is complete.
    async fn advance(&self, fetcher: &Fetcher, cursor: &Self::Cursor)
        -> (Slice, Option<Self::Cursor>);
}

/// Drives a [`PageStrategy`] until it signals completion or the cap is hit
pub struct Walker<S: PageStrategy> {
    strategy: S,
    delay: Duration,
    cap: Option<usize>,
}

impl<S: PageStrategy> Walker<S> {
    /// Creates a walker that sleeps `delay` between listing requests
    pub fn new(strategy: S, delay: Duration) -> Self {
        Self {
            strategy,
            delay,
            cap: None,
        }
    }

    /// Stops the walk once `cap` items have been collected
    pub fn with_cap(mut self, cap: Option<usize>) -> Self {
        self.cap = cap;
        self
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Walks the listing and returns items in discovery order
    ///
    /// Only the first item per id is kept; later repeats are counted in
    /// `stats.duplicates_removed` and do not count toward the cap. Failed
    /// slices after the first are logged, counted in `stats.errors` and
    /// contribute no items. A failure of the very first request aborts the
    /// walk with [`HarvestError::FirstRequest`].
    pub async fn walk(&self, fetcher: &Fetcher, stats: &mut RunStats) -> Result<Vec<CatalogItem>> {
        let mut cursor = self.strategy.start();
        let mut items: Vec<CatalogItem> = Vec::new();
        let mut seen: HashSet<RecordId> = HashSet::new();
        let mut requests = 0usize;

        tracing::info!("Walking listing with {} strategy", self.strategy.name());

        loop {
            if requests > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            tracing::debug!("Listing request {:?}", cursor);
            let (slice, next) = self.strategy.advance(fetcher, &cursor).await;
            requests += 1;

            let Slice {
                label,
                items: batch,
                error,
            } = slice;

            if let Some(error) = error {
                if requests == 1 {
                    return Err(HarvestError::FirstRequest {
                        label,
                        source: error,
                    });
                }
                tracing::warn!("Listing slice failed ({}): {}", label, error);
                stats.errors += 1;
            } else {
                tracing::debug!("{}: {} items", label, batch.len());
            }

            for item in batch {
                if self.cap_reached(items.len()) {
                    break;
                }
                stats.total_seen += 1;
                match item.id() {
                    Some(id) if !seen.insert(id.clone()) => {
                        tracing::debug!("Dropping repeated listing id {}", id);
                        stats.duplicates_removed += 1;
                    }
                    _ => items.push(item),
                }
            }

            if let Some(cap) = self.cap {
                if items.len() >= cap {
                    tracing::info!("Item cap of {} reached after {} requests", cap, requests);
                    break;
                }
            }

            match next {
                Some(next) => cursor = next,
                None => break,
            }
        }

        tracing::info!(
            "Listing complete: {} items from {} requests",
            items.len(),
            requests
        );

        Ok(items)
    }

    fn cap_reached(&self, collected: usize) -> bool {
        self.cap.map_or(false, |cap| collected >= cap)
    }
}

/// Extracts listing entries from a response body
///
/// Accepts either a bare array or an object wrapping the array under `data`.
/// Entries that are not objects are skipped.
pub fn listing_items(
    body: &Value,
    context: &str,
) -> std::result::Result<Vec<CatalogItem>, ParseError> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(ParseError::Body {
                    context: context.to_string(),
                    message: "no `data` array".to_string(),
                })
            }
        },
        _ => {
            return Err(ParseError::Body {
                context: context.to_string(),
                message: "expected an array or an object".to_string(),
            })
        }
    };

    let items: Vec<CatalogItem> = entries
        .iter()
        .cloned()
        .filter_map(CatalogItem::from_value)
        .collect();

    if items.len() < entries.len() {
        tracing::debug!(
            "{}: skipped {} non-object entries",
            context,
            entries.len() - items.len()
        );
    }

    Ok(items)
}
