//! Client identity pools for per-request rotation
//!
//! User-agent strings and proxy endpoints are read once from line-delimited
//! files and kept for the lifetime of the pool. A pool that failed to load
//! is simply empty, and an empty pool means "no rotation".

use crate::config::is_valid_endpoint;
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;

/// The client identity applied to one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// User agent header override
    pub user_agent: Option<String>,

    /// SOCKS proxy endpoint (`host:port`) override
    pub proxy: Option<String>,
}

impl Identity {
    /// The identity that leaves the fetcher's defaults untouched
    pub fn unrotated() -> Self {
        Self::default()
    }
}

/// Loaded user-agent and proxy pools
#[derive(Debug, Clone, Default)]
pub struct IdentityPool {
    user_agents: Vec<String>,
    proxies: Vec<String>,
}

impl IdentityPool {
    /// Creates a pool with nothing to rotate
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the pools from optional files
    ///
    /// A missing or unreadable file is logged and leaves that pool empty.
    /// Proxy lines that are not `host:port` are dropped with a warning.
    ///
    /// # Arguments
    ///
    /// * `user_agents` - File with one user-agent string per line
    /// * `proxies` - File with one `host:port` endpoint per line
    pub fn load(user_agents: Option<&Path>, proxies: Option<&Path>) -> Self {
        let user_agents = user_agents
            .map(|path| read_entries(path, "user-agents"))
            .unwrap_or_default();

        let proxies = match proxies.map(|path| (path, read_entries(path, "proxies"))) {
            Some((path, entries)) => {
                if entries.is_empty() {
                    tracing::warn!(
                        "No proxies found in {}; add one host:port entry per line",
                        path.display()
                    );
                }
                entries
            }
            None => Vec::new(),
        };

        Self::from_entries(user_agents, proxies)
    }

    /// Builds a pool from in-memory entries
    ///
    /// Blank entries are ignored; invalid proxy endpoints are dropped.
    pub fn from_entries(user_agents: Vec<String>, proxies: Vec<String>) -> Self {
        let user_agents = user_agents
            .into_iter()
            .map(|ua| ua.trim().to_string())
            .filter(|ua| !ua.is_empty())
            .collect();

        let proxies = proxies
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .filter(|p| {
                let valid = is_valid_endpoint(p);
                if !valid {
                    tracing::warn!("Invalid proxy format: {}. Expected host:port", p);
                }
                valid
            })
            .collect();

        Self {
            user_agents,
            proxies,
        }
    }

    /// Draws one identity; each part is drawn only when requested and
    /// available
    ///
    /// # Arguments
    ///
    /// * `rng` - Random source
    /// * `rotate_agent` - Draw a user agent from the pool
    /// * `rotate_proxy` - Draw a proxy endpoint from the pool
    pub fn draw<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        rotate_agent: bool,
        rotate_proxy: bool,
    ) -> Identity {
        let user_agent = if rotate_agent {
            self.user_agents.choose(rng).cloned()
        } else {
            None
        };

        let proxy = if rotate_proxy {
            self.proxies.choose(rng).cloned()
        } else {
            None
        };

        Identity { user_agent, proxy }
    }

    pub fn user_agents(&self) -> &[String] {
        &self.user_agents
    }

    /// Valid proxy endpoints, in file order
    pub fn proxies(&self) -> &[String] {
        &self.proxies
    }

    pub fn is_empty(&self) -> bool {
        self.user_agents.is_empty() && self.proxies.is_empty()
    }
}

fn read_entries(path: &Path, what: &str) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            tracing::warn!("Could not load {} from {}: {}", what, path.display(), e);
            Vec::new()
        }
    }
}
