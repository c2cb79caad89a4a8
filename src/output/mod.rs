//! Output module for persisting mirrored pages
//!
//! This module handles:
//! - Writing sanitized pages to their derived paths
//! - Recording the terminal outcome of every tracked URL
//! - Listing URLs that need manual follow-up

mod filesystem;
pub mod report;
mod traits;

pub use filesystem::FileSystemSink;
pub use report::{PageOutcome, RunReport};
pub use traits::{OutputError, OutputResult, PageSink};
