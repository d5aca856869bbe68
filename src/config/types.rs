use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for TorCrawl
///
/// Every section and field has a default, so an empty file (or no file at
/// all) yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub network: NetworkConfig,
    pub output: OutputConfig,
    pub extract: ExtractConfig,
}

/// How far a pass may reach into addresses discovered during that pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassMode {
    /// Items appended mid-pass are processed in the same pass
    #[default]
    Growing,

    /// Each pass stops at the frontier length it started with
    Snapshot,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of passes over the frontier
    pub depth: u32,

    /// Pause between items of a pass (seconds)
    #[serde(rename = "pause-seconds")]
    pub pause_seconds: f64,

    #[serde(rename = "pass-mode")]
    pub pass_mode: PassMode,

    /// Prefix `www.` when canonicalizing a seed without scheme
    #[serde(rename = "add-www")]
    pub add_www: bool,

    /// Supplementary link patterns, one regex per line
    #[serde(rename = "patterns-file")]
    pub patterns_file: Option<PathBuf>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            depth: 1,
            pause_seconds: 0.0,
            pass_mode: PassMode::Growing,
            add_www: false,
            patterns_file: Some(PathBuf::from(DEFAULT_PATTERNS_FILE)),
        }
    }
}

/// Transport and identity configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Route traffic through the local Tor SOCKS proxy
    #[serde(rename = "use-tor")]
    pub use_tor: bool,

    /// Tor SOCKS endpoint (host:port)
    #[serde(rename = "tor-proxy")]
    pub tor_proxy: String,

    /// Request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// User agent sent when rotation is off
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "random-user-agent")]
    pub random_user_agent: bool,

    #[serde(rename = "random-proxy")]
    pub random_proxy: bool,

    #[serde(rename = "user-agents-file")]
    pub user_agents_file: PathBuf,

    #[serde(rename = "proxies-file")]
    pub proxies_file: PathBuf,

    /// Endpoint that echoes the caller's public IP, queried on verbose runs
    #[serde(rename = "ip-check-url")]
    pub ip_check_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            use_tor: true,
            tor_proxy: DEFAULT_TOR_PROXY.to_string(),
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            random_user_agent: false,
            random_proxy: false,
            user_agents_file: PathBuf::from(DEFAULT_USER_AGENTS_FILE),
            proxies_file: PathBuf::from(DEFAULT_PROXIES_FILE),
            ip_check_url: DEFAULT_IP_CHECK_URL.to_string(),
        }
    }
}

/// Export format for a finished crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Text,
    Json,
    Xml,
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Base directory; each run writes into `<directory>/<host>`
    pub directory: PathBuf,

    pub formats: Vec<ExportFormat>,

    /// Write the visit order to `<prefix>_log.txt`
    #[serde(rename = "log-visited")]
    pub log_visited: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            formats: vec![ExportFormat::Text],
            log_visited: false,
        }
    }
}

/// Content extraction configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// TOML rule file gating what gets written or printed
    #[serde(rename = "rules-file")]
    pub rules_file: Option<PathBuf>,

    /// Strip markup before matching and printing
    #[serde(rename = "text-only")]
    pub text_only: bool,
}

pub const DEFAULT_TOR_PROXY: &str = "127.0.0.1:9050";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; rv:128.0) Gecko/20100101 Firefox/128.0";
pub const DEFAULT_PATTERNS_FILE: &str = "res/regex.txt";
pub const DEFAULT_USER_AGENTS_FILE: &str = "res/user_agents.txt";
pub const DEFAULT_PROXIES_FILE: &str = "res/proxies.txt";
pub const DEFAULT_IP_CHECK_URL: &str = "https://api.ipify.org/?format=json";
