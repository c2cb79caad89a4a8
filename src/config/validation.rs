use crate::config::types::{
    Config, FetchConfig, MirrorConfig, PaginationConfig, RetryConfig, SanitizeConfig,
};
use crate::ConfigError;
use regex::Regex;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_mirror_config(&config.mirror)?;
    validate_fetch_config(&config.fetch)?;
    validate_retry_config(&config.retry)?;
    validate_pagination_config(&config.pagination)?;
    validate_sanitize_config(&config.sanitize)?;
    Ok(())
}

/// Validates input/output and fan-out settings
fn validate_mirror_config(config: &MirrorConfig) -> Result<(), ConfigError> {
    if config.protocol != "https://" && config.protocol != "http://" {
        return Err(ConfigError::Validation(format!(
            "protocol must be \"https://\" or \"http://\", got '{}'",
            config.protocol
        )));
    }

    if config.input_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "input-file cannot be empty".to_string(),
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    if let Some(failed_list) = &config.failed_list {
        if failed_list.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "failed-list cannot be empty when set".to_string(),
            ));
        }
    }

    if config.max_concurrent < 1 || config.max_concurrent > 1024 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be between 1 and 1024, got {}",
            config.max_concurrent
        )));
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry settings
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.base_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "base-delay-ms ({}) cannot exceed max-delay-ms ({})",
            config.base_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

/// Validates pagination settings
fn validate_pagination_config(config: &PaginationConfig) -> Result<(), ConfigError> {
    Regex::new(&config.url_pattern).map_err(|e| {
        ConfigError::InvalidPattern(format!("url-pattern '{}': {}", config.url_pattern, e))
    })?;

    if config.stride == 0 {
        return Err(ConfigError::Validation("stride must be >= 1".to_string()));
    }

    Ok(())
}

/// Validates the marker token
///
/// The sanitizer repeats its rules until nothing changes. A marker that a rule
/// only partially matches (`sumi-mirror` against `\?hash=[a-z0-9]+`) grows on
/// every pass and never settles.
fn validate_sanitize_config(config: &SanitizeConfig) -> Result<(), ConfigError> {
    if config.marker.is_empty() {
        return Err(ConfigError::Validation("marker cannot be empty".to_string()));
    }

    if !config
        .marker
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(ConfigError::Validation(format!(
            "marker must contain only lowercase ASCII letters and digits, got '{}'",
            config.marker
        )));
    }

    Ok(())
}
