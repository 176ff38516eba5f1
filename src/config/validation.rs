use crate::config::types::{Config, CrawlerConfig, OutputConfig, ScanConfig, UserAgentConfig};
use crate::url::{ensure_scheme, request_target};
use crate::{ConfigError, UrlError};

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_scan_config(&config.scan)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.page_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "page_limit must be >= 1, got {}",
            config.page_limit
        )));
    }

    if config.timeout_secs < 1 || config.timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 120, got {}",
            config.timeout_secs
        )));
    }

    if config.max_concurrent_probes < 1 || config.max_concurrent_probes > 256 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_probes must be between 1 and 256, got {}",
            config.max_concurrent_probes
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent value cannot be empty".to_string(),
        ));
    }

    // Header values must be visible ASCII
    if !config.value.chars().all(|c| c == ' ' || c.is_ascii_graphic()) {
        return Err(ConfigError::Validation(format!(
            "user-agent value contains invalid characters: '{}'",
            config.value
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.report_path.is_empty() {
        return Err(ConfigError::Validation(
            "report_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the default scan target
///
/// Accepts exactly the roots a crawl accepts: a missing scheme defaults to
/// `http://`.
fn validate_scan_config(config: &ScanConfig) -> Result<(), ConfigError> {
    if let Some(root) = &config.root_url {
        match request_target(&ensure_scheme(root.trim())) {
            Ok(_) => {}
            Err(UrlError::InvalidScheme(scheme)) => {
                return Err(ConfigError::Validation(format!(
                    "root-url '{}' must use http or https, got {}",
                    root, scheme
                )));
            }
            Err(e) => {
                return Err(ConfigError::InvalidUrl(format!(
                    "Invalid root-url '{}': {}",
                    root, e
                )));
            }
        }
    }

    Ok(())
}
