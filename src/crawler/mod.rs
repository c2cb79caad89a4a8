//! Crawler module for fetching and assembling tracked pages
//!
//! This module contains the core mirroring logic, including:
//! - HTTP fetching with retry logic
//! - "Load more" pagination for listing pages
//! - Bounded concurrency across pipelines
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod paginator;
mod retry;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, classify_request_error, FetchResult, Fetcher};
pub use paginator::{PaginationError, Paginator, DEFAULT_STRIDE};
pub use retry::{retry_transient, RetryDecision, RetryExhausted, RetryPolicy};

use crate::config::Config;
use crate::output::RunReport;
use crate::url::read_tracked_urls;
use crate::MirrorError;

/// Runs a complete mirror pass
///
/// This is the main entry point. It will:
/// 1. Read the tracked URL list
/// 2. Run one pipeline per URL, all concurrently
/// 3. Log the summary
/// 4. Write the follow-up list, if configured
///
/// Per-URL failures are part of the returned report, not an error.
///
/// # Returns
///
/// * `Ok(RunReport)` - Every pipeline reached a terminal state
/// * `Err(MirrorError)` - The run could not start (unreadable input, bad client setup)
///
/// # Example
///
/// ```no_run
/// use sumi_mirror::config::load_config;
/// use sumi_mirror::crawler::mirror;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("mirror.toml"))?;
/// let report = mirror(config).await?;
/// println!("{} pages written", report.written());
/// # Ok(())
/// # }
/// ```
pub async fn mirror(config: Config) -> Result<RunReport, MirrorError> {
    let urls = read_tracked_urls(&config.mirror.input_file).await?;
    tracing::info!(
        "Start mirroring {} urls from {} into {}",
        urls.len(),
        config.mirror.input_file.display(),
        config.mirror.output_dir.display()
    );

    let coordinator = Coordinator::new(&config)?;
    let report = coordinator.run(urls).await;
    report.log_summary();

    if let Some(path) = &config.mirror.failed_list {
        report.write_failed_list(path).await?;
        tracing::info!("Wrote {} failed urls to {}", report.failed(), path.display());
    }

    Ok(report)
}
