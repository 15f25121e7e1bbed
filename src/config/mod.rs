//! Configuration module for ATC Spider
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every setting has a default, so the crawler also runs without a file.
//!
//! # Example
//!
//! ```no_run
//! use atc_spider::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("atc.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CloseSpiderConfig, Config, CrawlerConfig, OutputConfig, RetryConfig, SiteConfig,
    UserAgentConfig, MAX_DEPTH, MIN_DEPTH,
};

// Re-export parser functions
pub use parser::{
    clamp_depth, compute_config_hash, load_config, load_config_with_hash, parse_config,
    parse_level,
};
pub use validation::validate;
