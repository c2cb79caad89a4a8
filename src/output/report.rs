//! Per-run outcome bookkeeping
//!
//! The coordinator records one [`PageOutcome`] per tracked URL. The resulting
//! [`RunReport`] is only logged; skipped and failed pages never change the
//! process exit status.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Terminal state of one pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Sanitized content was written
    Written {
        /// Output file
        path: PathBuf,
        /// Number of bytes written
        bytes: usize,
    },

    /// The server answered with a status that is neither retried nor written
    Skipped {
        /// HTTP status code
        status: u16,
    },

    /// Retries ran out or the page could not be built or written
    Failed {
        /// Error description
        reason: String,
    },
}

impl PageOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// Outcome of a complete mirror run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    outcomes: BTreeMap<String, PageOutcome>,
}

impl RunReport {
    /// Starts a report stamped with the current time
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            outcomes: BTreeMap::new(),
        }
    }

    /// Records the terminal outcome for a URL
    pub fn record(&mut self, url: impl Into<String>, outcome: PageOutcome) {
        self.outcomes.insert(url.into(), outcome);
    }

    /// Marks the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn outcome(&self, url: &str) -> Option<&PageOutcome> {
        self.outcomes.get(url)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (&str, &PageOutcome)> {
        self.outcomes.iter().map(|(url, outcome)| (url.as_str(), outcome))
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn written(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_written()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, PageOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.failed_urls().len()
    }

    /// URLs that need manual follow-up, in sorted order
    pub fn failed_urls(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, PageOutcome::Failed { .. }))
            .map(|(url, _)| url.as_str())
            .collect()
    }

    /// Seconds between start and finish, if finished
    pub fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    /// Logs the closing summary
    pub fn log_summary(&self) {
        tracing::info!(
            "Stop mirroring: {} urls, {} written, {} skipped, {} failed in {:.1} sec",
            self.total(),
            self.written(),
            self.skipped(),
            self.failed(),
            self.duration_seconds().unwrap_or_default()
        );

        for url in self.failed_urls() {
            if let Some(PageOutcome::Failed { reason }) = self.outcomes.get(url) {
                tracing::error!("Needs follow-up: {} ({})", url, reason);
            }
        }
    }

    /// Writes the failed URLs to `path`, one per line
    pub async fn write_failed_list(&self, path: &Path) -> std::io::Result<()> {
        let mut content = self.failed_urls().join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, content).await
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
