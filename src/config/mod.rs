//! Configuration module for Placewalk
//!
//! This module handles loading, parsing, and validating the TOML
//! configuration file, and layering environment variable overrides on top.
//!
//! # Example
//!
//! ```no_run
//! use placewalk::config::{apply_env_overrides, load_config, validate};
//! use std::path::Path;
//!
//! let mut config = load_config(Path::new("config.toml")).unwrap();
//! apply_env_overrides(&mut config).unwrap();
//! validate(&config).unwrap();
//! println!("Crawl will retry up to {} times", config.crawl.max_retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlConfig, IndexConfig, DEFAULT_ENDPOINTS};

// Re-export parser functions
pub use parser::{apply_env_overrides, compute_config_hash, load_config, load_config_with_hash};

// Re-export validation
pub use validation::validate;
