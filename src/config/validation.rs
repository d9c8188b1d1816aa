use crate::config::types::{ApiConfig, Config, OutputConfig, ScanConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_scan_config(&config.scan)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the remote API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    validate_http_url("endpoint", &config.endpoint)?;
    validate_http_url("detail-base-url", &config.detail_base_url)?;

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    Ok(())
}

/// Validates scan pacing
fn validate_scan_config(config: &ScanConfig) -> Result<(), ConfigError> {
    // Rate-limit cooldown is never shorter than a transport retry
    if config.rate_limit_cooldown_secs < config.transient_retry_delay_secs {
        return Err(ConfigError::Validation(format!(
            "rate-limit-cooldown-secs ({}) must be >= transient-retry-delay-secs ({})",
            config.rate_limit_cooldown_secs, config.transient_retry_delay_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.snapshot_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "snapshot-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that `value` parses as an absolute http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("endpoint", "https://example.com/list").is_ok());
        assert!(validate_http_url("endpoint", "http://127.0.0.1:8080/list").is_ok());

        assert!(validate_http_url("endpoint", "").is_err());
        assert!(validate_http_url("endpoint", "not a url").is_err());
        assert!(validate_http_url("endpoint", "ftp://example.com/list").is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.api.request_timeout_secs = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_cooldown_shorter_than_retry_rejected() {
        let mut config = Config::default();
        config.scan.rate_limit_cooldown_secs = 1;
        config.scan.transient_retry_delay_secs = 3;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_delays_allowed() {
        let mut config = Config::default();
        config.scan.inter_page_delay_secs = 0;
        config.scan.transient_retry_delay_secs = 0;
        config.scan.rate_limit_cooldown_secs = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_blank_snapshot_path_rejected() {
        let mut config = Config::default();
        config.output.snapshot_path = "  ".to_string();
        assert!(validate(&config).is_err());
    }
}
