//! ATC Spider main entry point
//!
//! This is the command-line interface for the ATC/DDD index scraper.

use anyhow::{Context, Result};
use atc_spider::config::{load_config_with_hash, parse_level, validate, Config};
use atc_spider::crawler::run_crawl;
use atc_spider::output::feed_path;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ATC Spider: scrapes the WHO ATC/DDD index
///
/// ATC Spider walks the ATC/DDD index from the top level down to the
/// substance tables and writes every code with its description to a CSV
/// file under a timestamped output directory.
#[derive(Parser, Debug)]
#[command(name = "atc-spider")]
#[command(version = "1.0.0")]
#[command(about = "Scrapes ATC codes from the WHO ATC/DDD index", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum recursion depth (1-4); ignored unless all digits
    #[arg(short, long, value_name = "LEVEL")]
    level: Option<String>,

    /// Show a progress spinner while scraping
    #[arg(long)]
    progress_logging: bool,

    /// Directory that receives the timestamped output folders
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the effective configuration and exit without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    let outcome = run_crawl(config).await.context("Crawl failed")?;
    tracing::debug!("Crawl closed with reason {}", outcome.state.reason());

    // Every close reason is a normal exit
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("atc_spider=info,warn"),
            1 => EnvFilter::new("atc_spider=debug,info"),
            2 => EnvFilter::new("atc_spider=trace,debug"),
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

/// Loads the configuration file, if any, and applies command-line overrides
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(level) = &cli.level {
        match parse_level(level) {
            Some(depth) => config.crawler.max_depth = depth,
            None => tracing::warn!("Ignoring non-numeric level {:?}", level),
        }
    }

    if cli.progress_logging {
        config.crawler.progress_logging = true;
    }

    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.to_string_lossy().into_owned();
    }

    validate(&config).context("Invalid configuration")?;

    Ok(config)
}

/// Prints the effective configuration for --dry-run
fn print_dry_run(config: &Config) {
    println!("=== ATC Spider Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Allowed domains: {}", config.site.allowed_domains.join(", "));

    println!("\nCrawler:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Concurrent requests: {}", config.crawler.concurrent_requests);
    println!(
        "  Download delay: {}ms{}",
        config.crawler.download_delay_ms,
        if config.crawler.randomize_download_delay {
            " (randomized)"
        } else {
            ""
        }
    );
    println!("  Download timeout: {}s", config.crawler.download_timeout_secs);
    println!("  Obey robots.txt: {}", config.crawler.obey_robots);
    println!("  Progress logging: {}", config.crawler.progress_logging);
    println!("  User agent: {}", config.user_agent.name);

    println!("\nRetry:");
    println!("  Enabled: {}", config.retry.enabled);
    println!("  Times: {}", config.retry.times);
    println!("  HTTP codes: {:?}", config.retry.http_codes);

    println!("\nClose conditions (0 = disabled):");
    println!("  Timeout: {}s", config.close_spider.timeout_secs);
    println!(
        "  Timeout without items: {}s",
        config.close_spider.timeout_no_item_secs
    );
    println!("  Error count: {}", config.close_spider.error_count);

    println!("\nOutput:");
    println!(
        "  Feed: {}",
        feed_path(&config.output, chrono::Utc::now()).display()
    );

    println!("\n✓ Configuration is valid");
}
