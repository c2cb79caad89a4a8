//! URL handling module for Sumi-Mirror
//!
//! This module turns the tracked URL list into request URLs and output paths,
//! and recognizes which URLs are paginated listings.

mod matcher;
mod path;
mod tracked;

// Re-export main functions
pub use matcher::PaginationMatcher;
pub use path::{derive_output_path, path_segments};
pub use tracked::{parse_tracked_urls, read_tracked_urls, request_url};
