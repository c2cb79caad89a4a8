//! Output sink trait and error types

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for sanitized pages
///
/// Implementations must be safe to share between pipelines; each pipeline
/// writes to a distinct path, so no ordering between calls is assumed.
#[async_trait]
pub trait PageSink: Send + Sync {
    /// Persists `content` at `path`, replacing whatever was there
    ///
    /// # Arguments
    ///
    /// * `path` - The derived output path
    /// * `content` - Sanitized page text
    async fn write(&self, path: &Path, content: &str) -> OutputResult<()>;
}
