use crate::config::types::{Config, MAX_DEPTH, MIN_DEPTH};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use atc_spider::config::load_config;
///
/// let config = load_config(Path::new("atc.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(content)?;
    config.crawler.max_depth = clamp_depth(config.crawler.max_depth);

    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a feed can be traced back to the settings that
/// produced it.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
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

/// Clamps a recursion depth into the supported range
pub fn clamp_depth(depth: u32) -> u32 {
    depth.clamp(MIN_DEPTH, MAX_DEPTH)
}

/// Interprets the `level` command-line argument
///
/// Only an all-digit string is accepted; it is clamped to the supported
/// depth range. Anything else yields `None` and the configured depth stays.
///
/// ```
/// use atc_spider::config::parse_level;
///
/// assert_eq!(parse_level("2"), Some(2));
/// assert_eq!(parse_level("0"), Some(1));
/// assert_eq!(parse_level("99"), Some(4));
/// assert_eq!(parse_level("two"), None);
/// ```
pub fn parse_level(level: &str) -> Option<u32> {
    if level.is_empty() || !level.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    // Digits that overflow u32 are still "very deep"
    let depth = level.parse::<u32>().unwrap_or(u32::MAX);
    Some(clamp_depth(depth))
}
