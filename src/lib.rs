//! Sumi-Mirror: a diff-clean web page mirror
//!
//! This crate fetches a fixed set of tracked pages, normalizes the volatile
//! parts of their content, and writes each page to a deterministic path so
//! that consecutive snapshots can be compared byte for byte.

pub mod config;
pub mod crawler;
pub mod output;
pub mod sanitize;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Mirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Pagination error: {0}")]
    Pagination(#[from] crawler::PaginationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid pattern in config: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("URL '{0}' has no usable path segments")]
    Empty(String),
}

/// Result type alias for Sumi-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{mirror, Coordinator, FetchResult};
pub use output::{PageOutcome, RunReport};
pub use sanitize::{SanitizationRule, Sanitizer};
pub use url::{derive_output_path, read_tracked_urls};
