use crate::config::types::Config;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::str::FromStr;

/// Loads and parses a configuration file from the given path.
///
/// Validation runs separately (see [`crate::config::validate`]) so that
/// environment and CLI overrides can be layered on top of the file first.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content.
///
/// Logged at startup so operators can tell which configuration a given run
/// was executed with.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Applies environment variable overrides on top of a configuration.
///
/// Recognized variables: `OVERPASS_URLS` (comma-separated endpoint override
/// list), `OVERPASS_REGION`, `OVERPASS_BBOXES`, `OVERPASS_RETRIES`,
/// `OVERPASS_DELAY_MS`, `OVERPASS_TIMEOUT_SEC`, `ES_NODE_URL`, `ES_INDEX`,
/// `BULK_CHUNK_SIZE`, `ES_STARTUP_RETRIES`, `ES_STARTUP_DELAY_MS`.
/// An unparsable numeric value is a startup error, not a silent default.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
    apply_overrides(config, |var| std::env::var(var).ok())
}

pub(crate) fn apply_overrides(
    config: &mut Config,
    get: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(value) = get("OVERPASS_URLS") {
        config.crawl.endpoints = value
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(value) = get("OVERPASS_REGION") {
        config.crawl.region = Some(value);
    }
    if let Some(value) = get("OVERPASS_BBOXES") {
        config.crawl.bboxes = Some(value);
    }

    config.crawl.max_retries =
        parse_env("OVERPASS_RETRIES", get("OVERPASS_RETRIES"), config.crawl.max_retries)?;
    config.crawl.base_delay_ms =
        parse_env("OVERPASS_DELAY_MS", get("OVERPASS_DELAY_MS"), config.crawl.base_delay_ms)?;
    config.crawl.query_timeout_secs = parse_env(
        "OVERPASS_TIMEOUT_SEC",
        get("OVERPASS_TIMEOUT_SEC"),
        config.crawl.query_timeout_secs,
    )?;

    if let Some(value) = get("ES_NODE_URL") {
        config.index.node = value;
    }
    if let Some(value) = get("ES_INDEX") {
        config.index.index = value;
    }
    config.index.chunk_size =
        parse_env("BULK_CHUNK_SIZE", get("BULK_CHUNK_SIZE"), config.index.chunk_size)?;
    config.index.startup_retries = parse_env(
        "ES_STARTUP_RETRIES",
        get("ES_STARTUP_RETRIES"),
        config.index.startup_retries,
    )?;
    config.index.startup_delay_ms = parse_env(
        "ES_STARTUP_DELAY_MS",
        get("ES_STARTUP_DELAY_MS"),
        config.index.startup_delay_ms,
    )?;

    Ok(())
}

fn parse_env<T: FromStr>(var: &str, value: Option<String>, current: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(current),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            var: var.to_string(),
            value: raw,
        }),
    }
}
