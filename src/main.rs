//! Catalog-Harvester main entry point
//!
//! This is the command-line interface for the Catalog-Harvester product
//! catalog harvester and its snapshot utilities.

use anyhow::{bail, Context};
use catalog_harvester::config::{load_config, load_config_with_hash, Config, StrategyKind};
use catalog_harvester::harvest::{Coordinator, HarvestOptions, HarvestPlan, RunStatus};
use catalog_harvester::output::{print_summary, ImportSink, JsonlSink, RecordSink};
use catalog_harvester::record::EnrichedRecord;
use catalog_harvester::snapshot::{
    dedupe, filter_food, read_jsonl, select_batches, JsonlRecord, BATCH_SIZE,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvester: A polite product catalog harvester
///
/// Catalog-Harvester walks a retailer's paginated product API under strict
/// rate limits, enriches every product with its detail record, and keeps a
/// JSON Lines snapshot up to date between runs.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A polite product catalog harvester", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest the catalog into a JSON Lines stream
    Harvest {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Reconcile against a prior snapshot instead of harvesting from scratch
        #[arg(long, value_name = "SNAPSHOT")]
        update: Option<PathBuf>,

        /// Stop after this many items
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Harvest a single department batch (1-based)
        #[arg(long, value_name = "N")]
        batch: Option<usize>,

        /// Pagination strategy (overrides the configuration)
        #[arg(long, value_name = "STRATEGY")]
        strategy: Option<StrategyKind>,

        /// Output path (overrides the configuration)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Validate config and show what would be fetched without fetching
        #[arg(long)]
        dry_run: bool,
    },

    /// Drop records whose name repeats an earlier one
    Dedupe {
        input: PathBuf,
        output: PathBuf,
    },

    /// Drop non-food records by name keyword
    Filter {
        input: PathBuf,
        output: PathBuf,

        /// Configuration with a custom keyword list
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },

    /// Extract a range of 100-record batches
    Extract {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, value_name = "N")]
        from_batch: usize,

        /// Last batch to include (defaults to the end of the file)
        #[arg(long, value_name = "M")]
        to_batch: Option<usize>,

        /// Renumber ids from 1
        #[arg(long)]
        renumber: bool,
    },

    /// Post a JSON Lines file to the configured import endpoint
    Import {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Command::Harvest {
            config,
            update,
            limit,
            batch,
            strategy,
            output,
            dry_run,
        } => {
            let options = HarvestOptions {
                update_snapshot: update,
                limit,
                batch,
                strategy,
                output,
            };
            handle_harvest(&config, options, dry_run).await
        }
        Command::Dedupe { input, output } => handle_dedupe(&input, &output),
        Command::Filter {
            input,
            output,
            config,
        } => handle_filter(&input, &output, config.as_deref()),
        Command::Extract {
            input,
            output,
            from_batch,
            to_batch,
            renumber,
        } => handle_extract(&input, &output, from_batch, to_batch, renumber),
        Command::Import { config, input } => handle_import(&config, &input).await,
    };

    exit_code(result)
}

/// Logs a failed command once and maps it to a non-zero exit status
fn exit_code(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvester=info,warn"),
            1 => EnvFilter::new("catalog_harvester=debug,info"),
            2 => EnvFilter::new("catalog_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load(path: &Path) -> anyhow::Result<(Config, String)> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok((config, hash))
}

/// Handles the harvest subcommand, including --dry-run
async fn handle_harvest(
    config_path: &Path,
    options: HarvestOptions,
    dry_run: bool,
) -> anyhow::Result<()> {
    let (config, hash) = load(config_path)?;
    let coordinator = Coordinator::new(config.clone(), options, Some(hash))?;

    if dry_run {
        print_plan(&config, &coordinator.plan());
        return Ok(());
    }

    let report = coordinator.run().await?;
    print_summary(&report);

    if report.status == RunStatus::NoProducts {
        bail!("no products found");
    }
    Ok(())
}

fn print_plan(config: &Config, plan: &HarvestPlan) {
    println!("=== Catalog-Harvester Dry Run ===\n");

    println!("Source:");
    println!("  Listing: {}", plan.list_url);
    println!("  Detail path: {}", config.source.detail_path);
    println!("  Page size: {}", config.source.per_page);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!(
        "  Backoff: {}ms doubling to {}ms",
        config.retry.initial_backoff_ms, config.retry.max_backoff_ms
    );
    println!("  Timeout: {}s", config.retry.timeout_secs);

    println!("\nThrottle:");
    println!("  Listing: {}ms", config.throttle.listing_delay_ms);
    println!("  Detail: {}ms", config.throttle.detail_delay_ms);
    println!("  Reconcile: {}ms", config.throttle.reconcile_delay_ms);

    println!("\nPlan:");
    println!("  Strategy: {}", plan.strategy);
    if let Some(departments) = &plan.departments {
        println!("  Departments ({}):", departments.len());
        for department in departments {
            println!("    - {} {}", department.id, department.name);
        }
    }
    match plan.cap {
        Some(cap) => println!("  Item cap: {}", cap),
        None => println!("  Item cap: none"),
    }
    match plan.snapshot_records {
        Some(count) => println!("  Mode: update ({} stored records)", count),
        None => println!("  Mode: full"),
    }
    println!("  Output: {}", plan.output_path.display());

    println!("\n✓ Configuration is valid");
}

fn write_records(path: &Path, records: &[JsonlRecord]) -> anyhow::Result<usize> {
    let lines: Vec<String> = records.iter().map(JsonlRecord::to_line).collect();
    let written = JsonlSink::new(path).write_lines(lines.iter().map(String::as_str))?;
    Ok(written)
}

/// Handles the dedupe subcommand
fn handle_dedupe(input: &Path, output: &Path) -> anyhow::Result<()> {
    let document = read_jsonl(input)?;
    let total = document.records.len();
    let report = dedupe(document.records);

    let written = write_records(output, &report.kept)?;
    tracing::info!("Kept {} of {} records", written, total);

    println!("Records read: {}", total);
    println!("Duplicates removed: {}", report.removed);
    if !report.first_duplicates.is_empty() {
        println!("First duplicates:");
        for (line, name) in &report.first_duplicates {
            println!("  line {}: {:?}", line, name);
        }
    }
    println!("Wrote {} records to {}", written, output.display());

    Ok(())
}

/// Handles the filter subcommand
fn handle_filter(input: &Path, output: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let keywords = match config {
        Some(path) => load_config(path)?.filter.non_food_keywords,
        None => catalog_harvester::config::FilterConfig::default().non_food_keywords,
    };

    let document = read_jsonl(input)?;
    let total = document.records.len();
    let report = filter_food(document.records, &keywords);

    let written = write_records(output, &report.kept)?;

    println!("Records read: {}", total);
    println!("Non-food removed: {}", report.removed);
    println!("Without name: {}", report.skipped);
    if !report.first_removed.is_empty() {
        println!("First removed:");
        for (line, name) in &report.first_removed {
            println!("  line {}: {}", line, name);
        }
    }
    println!("Wrote {} records to {}", written, output.display());

    Ok(())
}

/// Handles the extract subcommand
fn handle_extract(
    input: &Path,
    output: &Path,
    from: usize,
    to: Option<usize>,
    renumber: bool,
) -> anyhow::Result<()> {
    let document = read_jsonl(input)?;
    let total = document.records.len();
    let selected = select_batches(document.records, from, to, BATCH_SIZE, renumber)?;

    if selected.is_empty() {
        tracing::warn!(
            "Batch {} starts past the end of {} ({} records)",
            from,
            input.display(),
            total
        );
    }

    let written = write_records(output, &selected)?;
    match to {
        Some(to) => println!("Extracted batches {}..={}: {} records", from, to, written),
        None => println!("Extracted batches {}..: {} records", from, written),
    }
    println!("Wrote {} records to {}", written, output.display());

    Ok(())
}

/// Handles the import subcommand
async fn handle_import(config_path: &Path, input: &Path) -> anyhow::Result<()> {
    let (config, _hash) = load(config_path)?;
    let Some(import) = &config.import else {
        bail!("{} has no [import] section", config_path.display());
    };

    let records: Vec<EnrichedRecord> = read_jsonl(input)?
        .records
        .into_iter()
        .map(|record| EnrichedRecord::from_fields(record.value))
        .collect();

    let mut sink = ImportSink::new(import, &config.user_agent)?;
    let report = sink.write_all(&records).await?;

    println!("Imported {} of {} records", report.written, records.len());
    if !report.is_complete() {
        println!("Failed batches: {:?}", report.failed_batches);
        bail!("{} import batches failed", report.failed_batches.len());
    }

    Ok(())
}
