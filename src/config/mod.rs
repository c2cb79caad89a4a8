//! Configuration module for Sumi-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional: [`Config::default`] describes a complete,
//! valid setup, and the command line can override the most common settings.
//!
//! # Example
//!
//! ```no_run
//! use sumi_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Mirroring into: {}", config.mirror.output_dir.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FetchConfig, MirrorConfig, PaginationConfig, RetryConfig, SanitizeConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
