//! HTTP fetcher implementation
//!
//! This module handles the page GET requests, including:
//! - Building the shared HTTP client (no redirects, fixed timeout)
//! - Classifying responses and network errors into [`FetchResult`]s
//! - Retrying transient failures through the [`RetryPolicy`]
//! - Bounding the number of requests in flight

use crate::config::{Config, FetchConfig};
use crate::crawler::retry::{retry_transient, RetryPolicy};
use reqwest::header::LOCATION;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};
use url::Url;

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Page body to sanitize and write
    Success {
        /// Body decoded as UTF-8
        content: String,
        /// HTTP status code (200 or 304)
        status: u16,
    },

    /// Transient failure; the same request should be issued again
    Retryable {
        /// Error description
        reason: String,
    },

    /// Non-retryable, non-success status; nothing is written
    Skip {
        /// HTTP status code
        status: u16,
    },

    /// The request cannot succeed (unbuildable request, retries exhausted)
    DefinitiveFailure {
        /// Error description
        reason: String,
    },
}

impl FetchResult {
    /// Returns true if this result ends the pipeline's fetch stage
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Retryable { .. })
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are never followed, and TLS verification can be disabled for
/// hosts with broken certificate chains.
///
/// # Example
///
/// ```no_run
/// use sumi_mirror::config::FetchConfig;
/// use sumi_mirror::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .redirect(Policy::none())
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Shared HTTP access for all pipelines
///
/// Holds the single client (and therefore the connection pool), the retry
/// policy, and the semaphore that caps requests in flight. A permit is held
/// for one attempt only, never across a backoff sleep.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    permits: Arc<Semaphore>,
}

impl Fetcher {
    pub fn new(client: Client, policy: RetryPolicy, max_concurrent: usize) -> Self {
        Self {
            client,
            policy,
            permits: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Builds the fetcher described by the configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(&config.fetch)?,
            RetryPolicy::from_config(&config.retry),
            config.mirror.max_concurrent,
        ))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Waits for a free request slot
    pub(crate) async fn acquire(&self) -> Result<SemaphorePermit<'_>, String> {
        self.permits
            .acquire()
            .await
            .map_err(|e| format!("request slot unavailable: {}", e))
    }

    /// Fetches a page, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 200, 304 | Success with the body |
    /// | HTTP 5xx | Retry with backoff |
    /// | Timeout, connection or body error | Retry with backoff |
    /// | HTTP 302 | Skip, body not logged |
    /// | Any other status | Skip, body logged at debug level |
    /// | Unbuildable request | DefinitiveFailure |
    /// | Retries exhausted | DefinitiveFailure |
    ///
    /// Never returns [`FetchResult::Retryable`].
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        let outcome = retry_transient(&self.policy, url.as_str(), move || async move {
            match self.fetch_once(url).await {
                FetchResult::Retryable { reason } => Err(reason),
                terminal => Ok(terminal),
            }
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(exhausted) => FetchResult::DefinitiveFailure {
                reason: exhausted.to_string(),
            },
        }
    }

    /// Performs a single GET attempt
    pub async fn fetch_once(&self, url: &Url) -> FetchResult {
        let _permit = match self.acquire().await {
            Ok(permit) => permit,
            Err(reason) => return FetchResult::Retryable { reason },
        };

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return classify_request_error(&e),
        };

        let status = response.status();

        if status.is_server_error() {
            return FetchResult::Retryable {
                reason: format!("Error {}", status.as_u16()),
            };
        }

        match status {
            StatusCode::OK | StatusCode::NOT_MODIFIED => match response.bytes().await {
                Ok(body) => FetchResult::Success {
                    content: String::from_utf8_lossy(&body).into_owned(),
                    status: status.as_u16(),
                },
                Err(e) => FetchResult::Retryable {
                    reason: format!("Failed to read body: {}", e),
                },
            },
            StatusCode::FOUND => {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::debug!("Skip {} because it redirects to '{}'", url, location);
                FetchResult::Skip {
                    status: status.as_u16(),
                }
            }
            _ => {
                let content = response.text().await.unwrap_or_default();
                tracing::debug!(
                    "Skip {} because status code == {}. Content: {}",
                    url,
                    status.as_u16(),
                    content
                );
                FetchResult::Skip {
                    status: status.as_u16(),
                }
            }
        }
    }
}

/// Classifies a reqwest error
///
/// A request that could not be built will fail the same way every time;
/// everything else (timeouts, refused connections, DNS, resets) is transient.
pub fn classify_request_error(error: &reqwest::Error) -> FetchResult {
    if error.is_builder() {
        FetchResult::DefinitiveFailure {
            reason: error.to_string(),
        }
    } else if error.is_timeout() {
        FetchResult::Retryable {
            reason: "Request timeout".to_string(),
        }
    } else if error.is_connect() {
        FetchResult::Retryable {
            reason: format!("Connection error: {}", error),
        }
    } else {
        FetchResult::Retryable {
            reason: format!("Client error: {}", error),
        }
    }
}
