use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Sumi-Mirror
///
/// Every section is optional in the TOML file; missing sections fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mirror: MirrorConfig,
    pub fetch: FetchConfig,
    pub retry: RetryConfig,
    pub pagination: PaginationConfig,
    pub sanitize: SanitizeConfig,
}

/// Input, output and fan-out settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Scheme prepended to every tracked URL
    pub protocol: String,

    /// File listing one tracked URL per line
    #[serde(rename = "input-file")]
    pub input_file: PathBuf,

    /// Root directory of the mirrored tree
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Where URLs that exhausted their retries are listed (optional)
    #[serde(rename = "failed-list")]
    pub failed_list: Option<PathBuf>,

    /// Maximum number of pipelines with a request in flight
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            protocol: "https://".to_string(),
            input_file: PathBuf::from("tracked_links.txt"),
            output_dir: PathBuf::from("data/"),
            failed_list: None,
            max_concurrent: 64,
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total timeout for a single attempt, in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification
    #[serde(rename = "accept-invalid-certs")]
    pub accept_invalid_certs: bool,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            accept_invalid_certs: true,
            user_agent: concat!("sumi-mirror/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry behaviour for transient failures
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts per logical operation; 0 retries forever
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Upper bound on the backoff delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            base_delay_ms: 250,
            max_delay_ms: 30_000,
        }
    }
}

/// "Load more" listing settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Regex matched against the tracked URL to decide whether it is paginated
    #[serde(rename = "url-pattern")]
    pub url_pattern: String,

    /// Offset increment between successive pages
    pub stride: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            url_pattern: r"/en/[a-z_]+/[a-z_]+/$".to_string(),
            stride: crate::crawler::DEFAULT_STRIDE,
        }
    }
}

/// Content normalization settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Token substituted for every erased volatile value
    pub marker: String,

    /// Also rewrite `id="..."` attributes to the marker
    #[serde(rename = "scrub-element-ids")]
    pub scrub_element_ids: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            marker: crate::sanitize::DEFAULT_MARKER.to_string(),
            scrub_element_ids: false,
        }
    }
}
