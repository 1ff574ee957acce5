//! Monograph main entry point
//!
//! Command-line interface for the rotating-proxy catalog crawler.

use clap::Parser;
use monograph::config::load_config_with_hash;
use monograph::crawler::CrawlEngine;
use monograph::extract::SelectorExtractor;
use monograph::sink::CsvSink;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Monograph: a rotating-proxy catalog crawler
///
/// Crawls an A-Z catalog index, fetches each article page through a
/// rotating pool of proxy endpoints, and stores extracted records.
#[derive(Parser, Debug)]
#[command(name = "monograph")]
#[command(version)]
#[command(about = "A rotating-proxy catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Maximum leaf pages to fetch (overrides the configured value)
    #[arg(long)]
    take: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let take = cli.take.unwrap_or(config.crawler.max_leaf_pages);

    if cli.dry_run {
        print_dry_run(&config, take);
        return Ok(());
    }

    let extractor = Arc::new(SelectorExtractor::new(config.site.clone()));
    let sink = Arc::new(CsvSink::new(&config.output)?);

    let mut engine = CrawlEngine::new(config, extractor, sink)?;

    // Ctrl-C stops dispatch of new fetches; in-flight ones finish.
    let shutdown = engine.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing in-flight fetches");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    let report = engine.run(take).await?;

    println!(
        "Stored {} records ({} fetched, {} failed, {} duplicates, {} extraction failures)",
        report.records_stored,
        report.leaves_fetched,
        report.leaves_failed,
        report.duplicates_skipped,
        report.extraction_failures
    );

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("monograph=info,warn"),
            1 => EnvFilter::new("monograph=debug,info"),
            2 => EnvFilter::new("monograph=trace,debug"),
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

/// Prints the validated configuration and what a run would do
fn print_dry_run(config: &monograph::Config, take: u32) {
    println!("=== Monograph Dry Run ===\n");

    println!("Crawler:");
    println!("  Leaf pages this run: {}", take);
    println!("  Concurrent fetches: {}", config.crawler.max_concurrent_fetches);
    println!("  Max jitter: {}s", config.crawler.max_jitter_secs);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Retry attempts: {}", config.crawler.retry_attempts);

    println!("\nProxy pool:");
    println!("  Endpoints: {}", config.proxy.endpoints.len());
    for endpoint in &config.proxy.endpoints {
        println!("    - {}", endpoint);
    }
    println!("  Direct fallback: {}", config.proxy.allow_direct);
    println!("  Request ceiling: {}", config.proxy.request_ceiling);
    println!("  Window: {}s", config.proxy.window_secs);

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Leaf selector: {}", config.site.leaf_selector);
    println!("  Pagination selector: {}", config.site.pagination_selector);

    println!("\nOutput:");
    println!("  CSV index: {}", config.output.csv_path);
    println!("  Articles: {}", config.output.articles_dir);

    println!("\n\u{2713} Configuration is valid");
    println!("\u{2713} Would seed 27 listing pages and fetch up to {} leaves", take);
}
