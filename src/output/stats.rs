//! Run statistics and the end-of-run summary
//!
//! Counters are accumulated by the harvest pipeline in a single task and
//! only ever increase during a run.

use crate::harvest::{RunReport, TallyClass};

/// Harvest run counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Listing items seen before de-duplication
    pub total_seen: u64,

    /// Repeated listing ids dropped
    pub duplicates_removed: u64,

    /// Records whose price list differed from the snapshot
    pub changed: u64,

    pub added: u64,
    pub updated: u64,
    pub unchanged: u64,

    /// Absorbed failures (failed slices, missing ids, failed detail fetches)
    pub errors: u64,
}

impl RunStats {
    /// Counts one tallied record
    pub fn record(&mut self, class: TallyClass) {
        match class {
            TallyClass::Added => self.added += 1,
            TallyClass::Updated => self.updated += 1,
            TallyClass::Unchanged => self.unchanged += 1,
            TallyClass::Error => self.errors += 1,
        }
    }

    /// Records tallied as added, updated or unchanged
    pub fn total_tallied(&self) -> u64 {
        self.added + self.updated + self.unchanged
    }
}

/// Logs the run summary and prints it to stdout
///
/// # Arguments
///
/// * `report` - The report of a finished run
pub fn print_summary(report: &RunReport) {
    let stats = &report.stats;

    tracing::info!(
        "Run {}: seen={} duplicates={} added={} updated={} unchanged={} changed={} errors={} written={}",
        report.status.as_str(),
        stats.total_seen,
        stats.duplicates_removed,
        stats.added,
        stats.updated,
        stats.unchanged,
        stats.changed,
        stats.errors,
        report.written
    );

    println!("=== Harvest Summary ===\n");

    println!("Run:");
    println!("  Status: {}", report.status.as_str());
    println!("  Started: {}", report.started_at.to_rfc3339());
    println!("  Duration: {}s", report.duration_seconds());
    if let Some(hash) = &report.config_hash {
        println!("  Config hash: {}", hash);
    }
    println!();

    println!("Listing:");
    println!("  Items seen: {}", stats.total_seen);
    println!("  Duplicates removed: {}", stats.duplicates_removed);
    println!();

    println!("Records:");
    println!("  Added: {}", stats.added);
    println!("  Updated: {}", stats.updated);
    println!("  Unchanged: {}", stats.unchanged);
    println!("  Price changes detected: {}", stats.changed);
    println!("  Errors: {}", stats.errors);
    println!();

    println!(
        "Wrote {} records to {}",
        report.written,
        report.output_path.display()
    );
}
