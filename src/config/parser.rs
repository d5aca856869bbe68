//! Configuration file loading
//!
//! A run's configuration is read once; the same bytes are parsed and
//! fingerprinted so the logged hash always describes what was applied.

use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parses and validates configuration text
///
/// Missing sections and keys take their defaults; unknown enum values (an
/// export format that does not exist, say) are parse errors.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex-encoded SHA-256 of configuration text
pub fn config_fingerprint(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - The file is unreadable, malformed or invalid
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use torcrawl::config::load_config;
///
/// let config = load_config(Path::new("torcrawl.toml")).unwrap();
/// println!("Depth: {}", config.crawler.depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Fingerprints a configuration file without parsing it
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(config_fingerprint(&std::fs::read_to_string(path)?))
}

/// Loads a configuration file and fingerprints the exact text that was parsed
///
/// # Returns
///
/// * `Ok((Config, String))` - The configuration and its hex SHA-256
/// * `Err(ConfigError)` - The file is unreadable, malformed or invalid
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, config_fingerprint(&content)))
}
