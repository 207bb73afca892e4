use crate::config::types::{Config, CrawlConfig, IndexConfig};
use crate::grid::named_region;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Called once at startup, after file, environment, and CLI overrides have
/// been merged; a run never starts with knobs that would fail mid-flight.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_index_config(&config.index)?;
    Ok(())
}

fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.query_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "query-timeout-secs must be >= 1, got {}",
            config.query_timeout_secs
        )));
    }

    let pool = config.endpoint_pool();
    if pool.is_empty() {
        return Err(ConfigError::Validation(
            "endpoint pool is empty".to_string(),
        ));
    }
    for endpoint in &pool {
        validate_http_url(endpoint)?;
    }

    if let Some(region) = &config.region {
        if named_region(region).is_none() {
            return Err(ConfigError::Validation(format!(
                "unknown region preset '{region}'"
            )));
        }
    }

    Ok(())
}

fn validate_index_config(config: &IndexConfig) -> Result<(), ConfigError> {
    validate_http_url(&config.node)?;

    if config.index.is_empty() {
        return Err(ConfigError::Validation(
            "index name cannot be empty".to_string(),
        ));
    }

    if config.chunk_size < 1 {
        return Err(ConfigError::Validation(format!(
            "chunk-size must be >= 1, got {}",
            config.chunk_size
        )));
    }

    if config.startup_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "startup-retries must be >= 1, got {}",
            config.startup_retries
        )));
    }

    Ok(())
}

fn validate_http_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("'{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "'{raw}': expected http or https scheme"
        )));
    }
    Ok(())
}
