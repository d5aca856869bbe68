use crate::config::types::{Config, CrawlerConfig, NetworkConfig, OutputConfig};
use crate::ConfigError;

/// Longest pause accepted between requests (one day)
pub const MAX_PAUSE_SECONDS: f64 = 86_400.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_network_config(&config.network)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // depth >= 0 is always true for u32, so no check needed

    if !config.pause_seconds.is_finite() || config.pause_seconds < 0.0 {
        return Err(ConfigError::Validation(format!(
            "pause_seconds must be a finite number >= 0, got {}",
            config.pause_seconds
        )));
    }

    if config.pause_seconds > MAX_PAUSE_SECONDS {
        return Err(ConfigError::Validation(format!(
            "pause_seconds must be at most {}, got {}",
            MAX_PAUSE_SECONDS, config.pause_seconds
        )));
    }

    Ok(())
}

/// Validates network configuration
fn validate_network_config(config: &NetworkConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if !is_valid_endpoint(&config.tor_proxy) {
        return Err(ConfigError::InvalidUrl(format!(
            "tor_proxy must be host:port, got '{}'",
            config.tor_proxy
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    match url::Url::parse(&config.ip_check_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => {
            return Err(ConfigError::InvalidUrl(format!(
                "ip_check_url must be an http(s) address, got '{}'",
                config.ip_check_url
            )))
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Returns true for a `host:port` proxy endpoint with a non-zero port
///
/// # Examples
///
/// ```
/// use torcrawl::config::is_valid_endpoint;
///
/// assert!(is_valid_endpoint("127.0.0.1:9050"));
/// assert!(is_valid_endpoint("proxy.example.com:3128"));
/// assert!(!is_valid_endpoint("127.0.0.1"));
/// assert!(!is_valid_endpoint("host:port"));
/// ```
pub fn is_valid_endpoint(endpoint: &str) -> bool {
    let Some((host, port)) = endpoint.trim().rsplit_once(':') else {
        return false;
    };

    if host.is_empty() || host.chars().any(|c| c.is_whitespace() || c == '/') {
        return false;
    }

    matches!(port.parse::<u16>(), Ok(p) if p > 0)
}
