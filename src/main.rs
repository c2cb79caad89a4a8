//! Sumi-Mirror main entry point
//!
//! This is the command-line interface for the Sumi-Mirror page mirror.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_mirror::config::{load_config_with_hash, validate, Config};
use sumi_mirror::crawler::mirror;
use sumi_mirror::url::{derive_output_path, read_tracked_urls};
use tracing_subscriber::EnvFilter;

/// Sumi-Mirror: a diff-clean web page mirror
///
/// Sumi-Mirror fetches every tracked page, erases volatile tokens from the
/// content and writes each page to a path derived from its URL, so that two
/// runs over unchanged pages produce identical files.
#[derive(Parser, Debug)]
#[command(name = "sumi-mirror")]
#[command(version)]
#[command(about = "A diff-clean web page mirror", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// File listing the tracked URLs, one per line
    #[arg(long, env = "INPUT_FILENAME")]
    input: Option<PathBuf>,

    /// Directory the mirrored pages are written to
    #[arg(long, env = "OUTPUT_FOLDER")]
    output: Option<PathBuf>,

    /// Maximum number of requests in flight
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show where every page would be written without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config).await?;
    } else {
        handle_mirror(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_mirror=info,warn"),
            1 => EnvFilter::new("sumi_mirror=debug,info"),
            2 => EnvFilter::new("sumi_mirror=trace,debug"),
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

/// Loads the configuration file (if any), applies command-line overrides and
/// validates the result
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(input) = &cli.input {
        config.mirror.input_file = input.clone();
    }
    if let Some(output) = &cli.output {
        config.mirror.output_dir = output.clone();
    }
    if let Some(max_concurrent) = cli.max_concurrent {
        config.mirror.max_concurrent = max_concurrent;
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows what would be mirrored and where
async fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Sumi-Mirror Dry Run ===\n");

    println!("Mirror Configuration:");
    println!("  Protocol: {}", config.mirror.protocol);
    println!("  Input file: {}", config.mirror.input_file.display());
    println!("  Output directory: {}", config.mirror.output_dir.display());
    println!("  Max concurrent requests: {}", config.mirror.max_concurrent);

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Accept invalid certs: {}", config.fetch.accept_invalid_certs);
    println!("  User agent: {}", config.fetch.user_agent);

    println!("\nRetry:");
    if config.retry.max_attempts == 0 {
        println!("  Max attempts: unlimited");
    } else {
        println!("  Max attempts: {}", config.retry.max_attempts);
    }
    println!(
        "  Backoff: {}ms to {}ms",
        config.retry.base_delay_ms, config.retry.max_delay_ms
    );

    println!("\nPagination:");
    println!("  Pattern: {}", config.pagination.url_pattern);
    println!("  Stride: {}", config.pagination.stride);

    let urls = read_tracked_urls(&config.mirror.input_file)
        .await
        .with_context(|| {
            format!(
                "Failed to read tracked urls from {}",
                config.mirror.input_file.display()
            )
        })?;

    println!("\nTracked URLs ({}):", urls.len());
    for url in &urls {
        match derive_output_path(&config.mirror.output_dir, url) {
            Ok(path) => println!("  - {} -> {}", url, path.display()),
            Err(e) => println!("  - {} -> (skipped: {})", url, e),
        }
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main mirror operation
async fn handle_mirror(config: Config) -> anyhow::Result<()> {
    let report = mirror(config).await.context("Mirror run failed")?;

    if report.failed() > 0 {
        tracing::warn!("{} urls need manual follow-up", report.failed());
    }

    Ok(())
}
