//! "Load more" listing assembly
//!
//! Some listing pages only render their first screen; the rest is served as
//! HTML fragments by POSTing successive offsets back to the same URL. The
//! [`Paginator`] walks those offsets one at a time and concatenates the
//! fragments into a single document.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::retry::{retry_transient, RetryExhausted};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Header that marks the request as an XHR "load more" call
const AJAX_HEADER: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

/// JSON field carrying the next fragment
const MORE_HTML_FIELD: &str = "more_html";

/// Default offset increment between pages
pub const DEFAULT_STRIDE: u32 = 200;

/// Why a listing could not be assembled
#[derive(Debug, Error)]
pub enum PaginationError {
    /// An offset kept failing until the retry policy gave up
    #[error(transparent)]
    Retries(#[from] RetryExhausted),

    /// The listing still had fragments at the largest representable offset
    #[error("listing {url} has more pages after offset {offset}")]
    OffsetOverflow { url: String, offset: u32 },
}

/// Collects every fragment of a paginated listing
///
/// Offsets are requested strictly in sequence; the next offset is only
/// requested after the current fragment has been appended.
#[derive(Debug)]
pub struct Paginator<'a> {
    fetcher: &'a Fetcher,
    stride: u32,
}

impl<'a> Paginator<'a> {
    pub fn new(fetcher: &'a Fetcher, stride: u32) -> Self {
        Self { fetcher, stride }
    }

    /// Requests offsets 0, stride, 2*stride, ... until a page has no fragment
    ///
    /// A failed offset is retried in place, so fragments are neither skipped
    /// nor duplicated.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Fragments joined with `\n`, in offset order
    /// * `Err(PaginationError::Retries)` - An offset kept failing until the policy gave up
    /// * `Err(PaginationError::OffsetOverflow)` - The next offset does not fit in a `u32`
    pub async fn collect(&self, url: &Url) -> Result<String, PaginationError> {
        let mut fragments: Vec<String> = Vec::new();
        let mut offset: u32 = 0;

        loop {
            let target = format!("{} offset {}", url, offset);
            let fragment = retry_transient(self.fetcher.policy(), &target, move || {
                self.fetch_fragment(url, offset)
            })
            .await?;

            match fragment {
                Some(html) => {
                    fragments.push(html);
                    offset = offset.checked_add(self.stride).ok_or_else(|| {
                        PaginationError::OffsetOverflow {
                            url: url.to_string(),
                            offset,
                        }
                    })?;
                }
                None => break,
            }
        }

        tracing::debug!("Collected {} fragments for {}", fragments.len(), url);
        Ok(fragments.join("\n"))
    }

    /// Requests a single offset
    ///
    /// * `Ok(Some(html))` - a fragment to append
    /// * `Ok(None)` - the listing is exhausted
    /// * `Err(reason)` - transient failure; retry the same offset
    async fn fetch_fragment(&self, url: &Url, offset: u32) -> Result<Option<String>, String> {
        tracing::info!("Url: {}, offset: {}", url, offset);

        let _permit = self.fetcher.acquire().await?;

        let response = self
            .fetcher
            .client()
            .post(url.clone())
            .header(AJAX_HEADER.0, AJAX_HEADER.1)
            .form(&[("offset", offset), ("more", 1)])
            .send()
            .await
            .map_err(|e| format!("Client or timeout error: {}", e))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!("Resend offset {} of {} because of {}", offset, url, status);
            return Err(format!("Error {}", status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| format!("Failed to read body: {}", e))?;

        let json: Value = serde_json::from_slice(&body)
            .map_err(|e| format!("Malformed listing page: {}", e))?;

        Ok(more_html(&json))
    }
}

/// Extracts a non-empty `more_html` string
fn more_html(json: &Value) -> Option<String> {
    match json.get(MORE_HTML_FIELD) {
        Some(Value::String(html)) if !html.is_empty() => Some(html.clone()),
        _ => None,
    }
}
