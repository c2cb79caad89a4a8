//! Mirror coordinator - per-URL pipeline orchestration
//!
//! Every tracked URL gets its own pipeline:
//! 1. Derive the output path
//! 2. Fetch the page (retrying transient failures)
//! 3. Replace paginated listings with their "load more" fragments
//! 4. Sanitize the content
//! 5. Write it to the derived path
//!
//! Pipelines run concurrently and never share mutable state; the only
//! shared resources are the HTTP client, the request slots and the sink.

use crate::config::Config;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::paginator::Paginator;
use crate::output::{FileSystemSink, PageOutcome, PageSink, RunReport};
use crate::sanitize::Sanitizer;
use crate::url::{derive_output_path, request_url, PaginationMatcher};
use crate::{ConfigError, MirrorError};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything one pipeline needs, shared read-only between tasks
struct Pipeline {
    protocol: String,
    output_dir: PathBuf,
    fetcher: Fetcher,
    sanitizer: Sanitizer,
    matcher: PaginationMatcher,
    stride: u32,
    sink: Arc<dyn PageSink>,
}

impl Pipeline {
    /// Runs the pipeline for one tracked URL and reports how it ended
    async fn process(&self, url: &str) -> PageOutcome {
        match self.try_process(url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Failed to mirror {}: {}", url, e);
                PageOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_process(&self, url: &str) -> Result<PageOutcome, MirrorError> {
        tracing::info!("Process {}", url);

        let path = derive_output_path(&self.output_dir, url)?;
        let target = request_url(&self.protocol, url)?;

        let mut content = match self.fetcher.fetch(&target).await {
            FetchResult::Success { content, .. } => content,
            FetchResult::Skip { status } => return Ok(PageOutcome::Skipped { status }),
            FetchResult::DefinitiveFailure { reason } | FetchResult::Retryable { reason } => {
                return Ok(PageOutcome::Failed { reason });
            }
        };

        // listings render only their first screen; the fragments are the page
        if self.matcher.is_paginated(url) {
            content = Paginator::new(&self.fetcher, self.stride)
                .collect(&target)
                .await?;
        }

        let content = self.sanitizer.sanitize(&content);

        tracing::info!("Write to {}", path.display());
        self.sink.write(&path, &content).await?;
        tracing::debug!(
            "Wrote {} bytes to {} (sha256 {})",
            content.len(),
            path.display(),
            hex::encode(Sha256::digest(content.as_bytes()))
        );

        Ok(PageOutcome::Written {
            path,
            bytes: content.len(),
        })
    }
}

/// Runs one pipeline per tracked URL
///
/// Cloning is cheap; clones share the client, the request slots and the sink.
#[derive(Clone)]
pub struct Coordinator {
    pipeline: Arc<Pipeline>,
}

impl Coordinator {
    /// Creates a coordinator that writes into the local file tree
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(MirrorError)` - The HTTP client or the pagination pattern could not be built
    pub fn new(config: &Config) -> Result<Self, MirrorError> {
        Self::with_sink(config, Arc::new(FileSystemSink::new()))
    }

    /// Creates a coordinator that hands pages to a custom sink
    pub fn with_sink(config: &Config, sink: Arc<dyn PageSink>) -> Result<Self, MirrorError> {
        let matcher = PaginationMatcher::new(&config.pagination.url_pattern)
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            pipeline: Arc::new(Pipeline {
                protocol: config.mirror.protocol.clone(),
                output_dir: config.mirror.output_dir.clone(),
                fetcher: Fetcher::from_config(config)?,
                sanitizer: Sanitizer::from_config(&config.sanitize),
                matcher,
                stride: config.pagination.stride,
                sink,
            }),
        })
    }

    /// Mirrors a single URL
    pub async fn mirror_one(&self, url: &str) -> PageOutcome {
        self.pipeline.process(url).await
    }

    /// Mirrors every URL concurrently and waits for all of them
    ///
    /// One failing pipeline never stops the others; a pipeline that panics
    /// is recorded as failed.
    pub async fn run(&self, urls: impl IntoIterator<Item = String>) -> RunReport {
        let mut report = RunReport::new();

        let handles: Vec<_> = urls
            .into_iter()
            .map(|url| {
                let pipeline = Arc::clone(&self.pipeline);
                let task_url = url.clone();
                let handle = tokio::spawn(async move { pipeline.process(&task_url).await });
                (url, handle)
            })
            .collect();

        tracing::info!("Started {} pipelines", handles.len());

        for (url, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Pipeline for {} aborted: {}", url, e);
                    PageOutcome::Failed {
                        reason: format!("pipeline aborted: {}", e),
                    }
                }
            };
            report.record(url, outcome);
        }

        report.finish();
        report
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("protocol", &self.pipeline.protocol)
            .field("output_dir", &self.pipeline.output_dir)
            .field("rules", &self.pipeline.sanitizer.rules().len())
            .finish()
    }
}
