//! Placewalk main entry point
//!
//! This is the command-line interface for the Placewalk place harvester.

use anyhow::Context;
use clap::Parser;
use placewalk::config::{apply_env_overrides, load_config_with_hash, validate, Config};
use placewalk::crawler::run_harvest;
use placewalk::grid::resolve_boxes;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Placewalk: a polite place harvester
///
/// Placewalk crawls the public Overpass API over a grid of bounding boxes,
/// normalizes and de-duplicates the places it finds, and bulk-loads them
/// into a search index.
#[derive(Parser, Debug)]
#[command(name = "placewalk")]
#[command(version = "1.0.0")]
#[command(about = "A polite place harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl a named region preset instead of the full grid
    #[arg(long)]
    region: Option<String>,

    /// Crawl explicit boxes: `south,west,north,east` quadruples joined by `;`
    #[arg(long, value_name = "BOXES")]
    bboxes: Option<String>,

    /// Validate config and show the crawl plan without touching the network
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration: file (when given), then env, then CLI overrides
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config).context("invalid environment override")?;

    if let Some(region) = cli.region {
        config.crawl.region = Some(region);
    }
    if let Some(bboxes) = cli.bboxes {
        config.crawl.bboxes = Some(bboxes);
    }

    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("placewalk=info,warn"),
            1 => EnvFilter::new("placewalk=debug,info"),
            2 => EnvFilter::new("placewalk=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the crawl plan
fn handle_dry_run(config: &Config) {
    println!("=== Placewalk Dry Run ===\n");

    println!("Crawl Configuration:");
    println!("  Max retries per box: {}", config.crawl.max_retries);
    println!("  Base delay: {}ms", config.crawl.base_delay_ms);
    println!("  Query timeout: {}s", config.crawl.query_timeout_secs);

    let pool = config.crawl.endpoint_pool();
    println!("\nEndpoint Pool ({}):", pool.len());
    for endpoint in &pool {
        println!("  - {}", endpoint);
    }

    let boxes = resolve_boxes(&config.crawl);
    println!("\nBounding Boxes ({}):", boxes.len());
    for bbox in &boxes {
        println!("  - {}", bbox);
    }

    println!("\nSearch Index:");
    println!("  Node: {}", config.index.node);
    println!("  Index: {}", config.index.index);
    println!("  Bulk chunk size: {}", config.index.chunk_size);

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} box(es)", boxes.len());
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting harvest");

    match run_harvest(config).await {
        Ok(report) => {
            tracing::info!(
                "Harvest completed: {} box(es), {} element(s) ({} rejected), {} unique place(s), {} indexed",
                report.boxes,
                report.elements,
                report.rejected,
                report.unique,
                report.indexed
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
