//! Harvest module for walking, enriching and reconciling the catalog
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with bounded retry
//! - Pagination strategies and the walker that drives them
//! - Detail enrichment and category classification
//! - Delta reconciliation against a prior snapshot
//! - Overall run coordination

mod coordinator;
mod department;
mod enricher;
mod fetcher;
mod link;
mod reconciler;
mod tally;
mod walker;

pub use coordinator::{
    run_harvest, Coordinator, HarvestOptions, HarvestPlan, RunReport, RunStatus,
};
pub use department::{department_scope, DepartmentCursor, DepartmentStrategy};
pub use enricher::{DetailEndpoint, Enricher};
pub use fetcher::{build_http_client, Backoff, Fetcher, RetryPolicy};
pub use link::{LinkCursor, LinkStrategy, PageInfo};
pub use reconciler::{classify, Reconciler};
pub use tally::{tally, tally_class, TallyClass};
pub use walker::{listing_items, PageStrategy, Slice, Walker};
