//! Configuration module for TorCrawl
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Command-line flags are applied on top of the loaded values by the
//! binary.
//!
//! # Example
//!
//! ```no_run
//! use torcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("torcrawl.toml")).unwrap();
//! println!("Crawler will make {} passes", config.crawler.depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ExportFormat, ExtractConfig, NetworkConfig, OutputConfig, PassMode,
    DEFAULT_IP_CHECK_URL, DEFAULT_PATTERNS_FILE, DEFAULT_PROXIES_FILE, DEFAULT_TOR_PROXY, DEFAULT_USER_AGENT,
    DEFAULT_USER_AGENTS_FILE,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, config_fingerprint, load_config, load_config_with_hash, parse_config,
};
pub use validation::{is_valid_endpoint, validate, MAX_PAUSE_SECONDS};
