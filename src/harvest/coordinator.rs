//! Harvest coordinator - run orchestration
//!
//! A run is a single sequential pipeline:
//! - Walk the listing with the configured pagination strategy, keeping the
//!   first item per id
//! - Enrich every item with its detail record
//! - Reconcile against the prior snapshot (update mode)
//! - Tally, then write the record stream

use crate::category::CategoryResolver;
use crate::config::{Config, DepartmentEntry, StrategyKind};
use crate::harvest::department::{department_scope, DepartmentStrategy};
use crate::harvest::enricher::{DetailEndpoint, Enricher};
use crate::harvest::link::LinkStrategy;
use crate::harvest::reconciler::Reconciler;
use crate::harvest::tally::tally;
use crate::harvest::walker::Walker;
use crate::harvest::Fetcher;
use crate::output::{JsonlSink, RecordSink, RunStats};
use crate::record::{CatalogItem, Delta, EnrichedRecord, RecordId};
use crate::snapshot::Snapshot;
use crate::{ConfigError, HarvestError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::PathBuf;

/// Per-run options supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct HarvestOptions {
    /// Prior snapshot to reconcile against
    pub update_snapshot: Option<PathBuf>,
    /// Item cap
    pub limit: Option<usize>,
    /// 1-based department batch
    pub batch: Option<usize>,
    /// Overrides the configured pagination strategy
    pub strategy: Option<StrategyKind>,
    /// Overrides the configured output path
    pub output: Option<PathBuf>,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// The listing produced nothing; no output was written
    NoProducts,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::NoProducts => "no products found",
        }
    }
}

/// Outcome of one harvest run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub stats: RunStats,
    /// Records written to the output stream
    pub written: usize,
    pub status: RunStatus,
    pub output_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: Option<String>,
}

impl RunReport {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// What a run would fetch, resolved without network activity
#[derive(Debug, Clone)]
pub struct HarvestPlan {
    pub strategy: StrategyKind,
    pub list_url: String,
    /// Departments in scope (department strategy only)
    pub departments: Option<Vec<DepartmentEntry>>,
    pub cap: Option<usize>,
    pub snapshot_records: Option<usize>,
    pub output_path: PathBuf,
}

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Config,
    options: HarvestOptions,
    config_hash: Option<String>,
    strategy: StrategyKind,
    departments: Option<Vec<DepartmentEntry>>,
    snapshot: Option<Snapshot>,
    output_path: PathBuf,
}

impl Coordinator {
    /// Creates a coordinator and resolves everything that can fail locally
    ///
    /// The snapshot is loaded and the department scope resolved here, so
    /// missing input or an invalid batch fails before any request is made.
    pub fn new(
        config: Config,
        options: HarvestOptions,
        config_hash: Option<String>,
    ) -> Result<Self> {
        let strategy = match (options.strategy, options.batch) {
            (Some(strategy), _) => strategy,
            (None, Some(_)) => StrategyKind::Department,
            (None, None) => config.pagination.strategy,
        };

        if strategy == StrategyKind::Link && options.batch.is_some() {
            return Err(ConfigError::Validation(
                "a department batch requires the department strategy".to_string(),
            )
            .into());
        }
        if options.limit == Some(0) {
            return Err(ConfigError::Validation("limit must be greater than 0".to_string()).into());
        }

        let departments = match strategy {
            StrategyKind::Link => None,
            StrategyKind::Department => Some(department_scope(
                &config.pagination.departments,
                config.pagination.department_batch_size,
                options.batch,
            )?),
        };

        let snapshot = match &options.update_snapshot {
            Some(path) => {
                let snapshot = Snapshot::load(path)?;
                tracing::info!(
                    "Loaded snapshot {} with {} records",
                    path.display(),
                    snapshot.len()
                );
                Some(snapshot)
            }
            None => None,
        };

        let output_path = options
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.output.path));

        Ok(Self {
            config,
            options,
            config_hash,
            strategy,
            departments,
            snapshot,
            output_path,
        })
    }

    /// The resolved fetch scope
    pub fn plan(&self) -> HarvestPlan {
        HarvestPlan {
            strategy: self.strategy,
            list_url: format!(
                "{}{}",
                self.config.source.base_url.trim_end_matches('/'),
                self.config.source.list_path
            ),
            departments: self.departments.clone(),
            cap: self.options.limit,
            snapshot_records: self.snapshot.as_ref().map(Snapshot::len),
            output_path: self.output_path.clone(),
        }
    }

    /// Runs the harvest pipeline to completion
    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        let fetcher = Fetcher::new(&self.config)?;
        let mut stats = RunStats::default();

        tracing::info!(
            "Starting harvest ({} strategy, {})",
            self.strategy,
            if self.snapshot.is_some() { "update mode" } else { "full mode" }
        );

        let listed = match self.list(&fetcher, &mut stats).await {
            Ok(items) => items,
            Err(HarvestError::FirstRequest { label, source }) => {
                tracing::error!("No products found: first listing request failed ({}): {}", label, source);
                stats.errors += 1;
                return Ok(self.report(stats, 0, RunStatus::NoProducts, started_at));
            }
            Err(e) => return Err(e),
        };

        if listed.is_empty() {
            tracing::warn!("No products found; nothing written");
            return Ok(self.report(stats, 0, RunStatus::NoProducts, started_at));
        }

        let enricher = Enricher::new(
            DetailEndpoint::from_config(&self.config.source),
            self.config.throttle.detail_delay(),
        )
        .with_resolver(
            self.config
                .categories
                .enabled
                .then(|| CategoryResolver::from_config(&self.config.categories)),
        )
        .with_cap(self.options.limit);
        let records = enricher.enrich(&fetcher, listed, &mut stats).await;

        let classified: Vec<(EnrichedRecord, Option<Delta>)> = match &self.snapshot {
            Some(snapshot) => {
                let reconciler = Reconciler::new(
                    DetailEndpoint::from_config(&self.config.source),
                    self.config.throttle.reconcile_delay(),
                );
                reconciler
                    .reconcile(&fetcher, snapshot, records, &mut stats)
                    .await
                    .into_iter()
                    .map(|outcome| (outcome.record, Some(outcome.delta)))
                    .collect()
            }
            None => records.into_iter().map(|record| (record, None)).collect(),
        };

        tally(&classified, self.config.throttle.tally_delay(), &mut stats).await;

        let mut output: Vec<EnrichedRecord> =
            classified.into_iter().map(|(record, _)| record).collect();
        if let Some(snapshot) = &self.snapshot {
            let carried = carry_over(snapshot, &mut output);
            if carried > 0 {
                tracing::info!("Carried over {} stored records not seen in this run", carried);
            }
        }

        let mut sink = JsonlSink::new(&self.output_path);
        let written = sink.write_all(&output).await?.written;
        tracing::info!("Wrote {} records to {}", written, self.output_path.display());

        Ok(self.report(stats, written, RunStatus::Completed, started_at))
    }

    async fn list(
        &self,
        fetcher: &Fetcher,
        stats: &mut RunStats,
    ) -> Result<Vec<CatalogItem>> {
        let delay = self.config.throttle.listing_delay();
        let cap = self.options.limit;

        match &self.departments {
            None => {
                Walker::new(LinkStrategy::from_config(&self.config.source), delay)
                    .with_cap(cap)
                    .walk(fetcher, stats)
                    .await
            }
            Some(departments) => {
                let strategy = DepartmentStrategy::from_config(
                    &self.config.source,
                    &self.config.pagination,
                    departments.clone(),
                );
                Walker::new(strategy, delay)
                    .with_cap(cap)
                    .walk(fetcher, stats)
                    .await
            }
        }
    }

    fn report(
        &self,
        stats: RunStats,
        written: usize,
        status: RunStatus,
        started_at: DateTime<Utc>,
    ) -> RunReport {
        RunReport {
            stats,
            written,
            status,
            output_path: self.output_path.clone(),
            started_at,
            finished_at: Utc::now(),
            config_hash: self.config_hash.clone(),
        }
    }
}

/// Appends stored records whose id was not produced by this run, in
/// snapshot order. Returns the number appended.
fn carry_over(snapshot: &Snapshot, output: &mut Vec<EnrichedRecord>) -> usize {
    let seen: HashSet<RecordId> = output.iter().filter_map(EnrichedRecord::id).collect();
    let before = output.len();

    output.extend(
        snapshot
            .records()
            .iter()
            .filter(|record| record.id().map_or(true, |id| !seen.contains(&id)))
            .cloned(),
    );

    output.len() - before
}

/// Runs a complete harvest
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `options` - Per-run options
/// * `config_hash` - Fingerprint of the configuration file, for the summary
pub async fn run_harvest(
    config: Config,
    options: HarvestOptions,
    config_hash: Option<String>,
) -> Result<RunReport> {
    let coordinator = Coordinator::new(config, options, config_hash)?;
    coordinator.run().await
}
