//! Placewalk: a polite place harvester
//!
//! This crate implements a one-shot batch pipeline that crawls the public
//! Overpass API over a country-sized grid of bounding boxes, normalizes the
//! raw geodata elements into canonical place records, de-duplicates them
//! across overlapping grid cells, and bulk-loads the result into a search
//! index used for geo queries.

pub mod config;
pub mod crawler;
pub mod grid;
pub mod index;
pub mod place;

use thiserror::Error;

/// Main error type for Placewalk operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Geodata fetch for {bbox} failed via {endpoint}: {source}")]
    Transport {
        bbox: grid::BoundingBox,
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("Geodata endpoint {endpoint} answered HTTP {status} for {bbox}: {body}")]
    Endpoint {
        bbox: grid::BoundingBox,
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Exhausted {attempts} fetch attempts for {bbox}")]
    FetchExhausted {
        bbox: grid::BoundingBox,
        attempts: u32,
    },

    #[error("Search index error: {0}")]
    Index(#[from] index::IndexError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: String, value: String },

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Placewalk operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_harvest, HarvestReport};
pub use grid::BoundingBox;
pub use index::{IndexError, SearchIndex};
pub use place::{Category, PlaceRecord};
