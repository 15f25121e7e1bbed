//! ATC Spider: a scraper for the WHO ATC/DDD index
//!
//! This crate walks the hierarchical ATC/DDD index, following section-header
//! links down to the leaf tables, and writes every `(code, description)` pair
//! it sees to a CSV feed.

pub mod config;
pub mod crawler;
pub mod output;
pub mod report;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for ATC Spider operations
#[derive(Debug, Error)]
pub enum AtcError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    /// The page's links and texts no longer line up, which means the site
    /// markup changed and the extraction rule is stale
    #[error("Structural mismatch: {codes} codes but {labels} labels")]
    StructuralMismatch { codes: usize, labels: usize },

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
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

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for ATC Spider operations
pub type Result<T> = std::result::Result<T, AtcError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{ClassificationRecord, PageNode};
pub use state::CrawlState;
