use crate::config::types::{Config, CrawlerConfig, OutputConfig, ProxyConfig, SiteConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_proxy_config(&config.proxy)?;
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_leaf_pages < 1 {
        return Err(ConfigError::Validation(
            "max_leaf_pages must be >= 1".to_string(),
        ));
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 64, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.retry_attempts < 1 {
        return Err(ConfigError::Validation(
            "retry_attempts must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates proxy configuration
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    for endpoint in &config.endpoints {
        let url = Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("proxy endpoint '{}': {}", endpoint, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "proxy endpoint '{}' must use http or https",
                endpoint
            )));
        }
    }

    if config.request_ceiling < 1 {
        return Err(ConfigError::Validation(
            "request_ceiling must be >= 1".to_string(),
        ));
    }

    if config.window_secs < 1 {
        return Err(ConfigError::Validation(
            "window_secs must be >= 1".to_string(),
        ));
    }

    // No proxies and no direct fallback means no fetch can ever proceed.
    if config.endpoints.is_empty() && !config.allow_direct {
        return Err(ConfigError::Validation(
            "allow_direct = false requires at least one proxy endpoint".to_string(),
        ));
    }

    Ok(())
}

/// Validates the site profile
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            config.base_url
        )));
    }

    for (name, selector) in [
        ("leaf_selector", &config.leaf_selector),
        ("pagination_selector", &config.pagination_selector),
        ("title_selector", &config.title_selector),
        ("content_selector", &config.content_selector),
        ("image_selector", &config.image_selector),
    ] {
        Selector::parse(selector)
            .map_err(|_| ConfigError::InvalidSelector(format!("{}: '{}'", name, selector)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty".to_string(),
        ));
    }

    if config.articles_dir.is_empty() {
        return Err(ConfigError::Validation(
            "articles_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
