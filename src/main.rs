//! repo-scout main entry point
//!
//! This is the command-line interface for the repo-scout listing crawler.

use anyhow::{bail, Context};
use clap::Parser;
use repo_scout::config::{load_config_with_hash, validate, Config, ExportFormat};
use repo_scout::crawler::{Coordinator, CrawlOutcome};
use repo_scout::output::{generate_markdown_summary, print_statistics, write_export, CrawlSummary};
use repo_scout::url::resolve_seed;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// repo-scout: a polite repository listing crawler
///
/// repo-scout walks an account's public repository listing, visits each
/// repository page, and exports one record per repository with its
/// description, last update, languages and commit count.
#[derive(Parser, Debug)]
#[command(name = "repo-scout")]
#[command(version)]
#[command(about = "A polite repository listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", required_unless_present = "target")]
    config: Option<PathBuf>,

    /// Account name or listing URL to crawl (overrides the config seed)
    #[arg(short, long)]
    target: Option<String>,

    /// Export file path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export document format
    #[arg(long, value_enum)]
    format: Option<ExportFormat>,

    /// Fetches allowed in flight at once
    #[arg(long)]
    concurrency: Option<u32>,

    /// Minimum delay between requests to the same host (milliseconds)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Maximum number of listing pages to follow
    #[arg(long)]
    max_pages: Option<u32>,

    /// Write a markdown crawl summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_crawl(config, config_hash.as_deref(), cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("repo_scout=info,warn"),
            1 => EnvFilter::new("repo_scout=debug,info"),
            2 => EnvFilter::new("repo_scout=trace,debug"),
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

/// Loads the configuration file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => match &cli.target {
            Some(target) => (Config::default_for(target.clone()), None),
            None => bail!("either a config file or --target is required"),
        },
    };

    if let Some(target) = &cli.target {
        config.seed.target = target.clone();
    }
    if let Some(output) = &cli.output {
        config.output.path = output.display().to_string();
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(delay) = cli.delay_ms {
        config.crawler.request_delay_ms = delay;
    }
    if cli.max_pages.is_some() {
        config.crawler.max_pages = cli.max_pages;
    }
    if let Some(summary) = &cli.summary {
        config.output.summary_path = Some(summary.display().to_string());
    }

    validate(&config).context("invalid configuration")?;
    Ok((config, hash))
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let seed = resolve_seed(&config.seed).context("cannot resolve seed")?;

    println!("=== repo-scout Dry Run ===\n");

    println!("Seed:");
    println!("  Target: {}", config.seed.target);
    println!("  Listing URL: {}", seed);

    println!("\nCrawler Configuration:");
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Concurrency: {}", config.crawler.concurrency);
    match config.crawler.max_pages {
        Some(max) => println!("  Max listing pages: {}", max),
        None => println!("  Max listing pages: unlimited"),
    }
    println!("  Timeout: {}s", config.crawler.timeout_secs);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.crawler.max_retries, config.crawler.retry_backoff_ms
    );
    println!(
        "  Follow commits page: {}",
        config.crawler.follow_commits_page
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Export: {} ({:?})", config.output.path, config.output.format);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: Option<&str>, quiet: bool) -> anyhow::Result<()> {
    let output_path = PathBuf::from(&config.output.path);
    let format = config.output.format;
    let summary_path = config.output.summary_path.clone();

    let mut coordinator = Coordinator::from_config(config).context("failed to set up crawler")?;

    // Ctrl-C stops new fetches; what has been finished is still exported
    let stop = coordinator.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight fetches");
            stop.stop();
        }
    });

    let report = match coordinator.run().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if report.outcome == CrawlOutcome::Stopped {
        tracing::warn!(
            "Crawl stopped early; exporting {} finished records",
            report.records.len()
        );
    }

    write_export(&output_path, format, &report.records)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    if let Some(path) = summary_path {
        generate_markdown_summary(&report, config_hash, Path::new(&path))
            .with_context(|| format!("failed to write summary {}", path))?;
        tracing::info!("Summary written to {}", path);
    }

    if !quiet {
        let mut summary = CrawlSummary::from_report(&report);
        if let Some(hash) = config_hash {
            summary = summary.with_config_hash(hash);
        }
        print_statistics(&summary);
    }

    Ok(())
}
