use crate::{UrlError, UrlResult};
use std::collections::BTreeSet;
use std::path::Path;
use url::Url;

/// Reads the tracked URL list
///
/// One scheme-less URL per line. Surrounding whitespace is trimmed, blank
/// lines are ignored and duplicates collapse into one entry.
pub async fn read_tracked_urls(path: &Path) -> std::io::Result<BTreeSet<String>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(parse_tracked_urls(&content))
}

/// Parses the content of a tracked URL list
pub fn parse_tracked_urls(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds the absolute request URL for a tracked URL
///
/// # Examples
///
/// ```
/// use sumi_mirror::url::request_url;
///
/// let url = request_url("https://", "example.com/faq").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/faq");
/// ```
pub fn request_url(protocol: &str, url: &str) -> UrlResult<Url> {
    Url::parse(&format!("{}{}", protocol, url)).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))
}
