//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients routed through a SOCKS proxy (Tor or rotation)
//! - Applying the per-request identity (user agent, proxy)
//! - Redirect handling
//! - Error classification into skip-and-continue outcomes

use crate::config::NetworkConfig;
use crate::crawler::identity::Identity;
use reqwest::{header::USER_AGENT, redirect::Policy, Client, Proxy};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
///
/// Every failure variant is contained to the item being fetched; none of
/// them stops a crawl.
#[derive(Debug, Clone)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Raw page body
        body: Vec<u8>,
    },

    /// The address could not be turned into a request
    InvalidUrl {
        /// Error description
        error: String,
    },

    /// The server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Host unreachable (connection refused, timeout, proxy failure, etc.)
    NetworkError {
        /// Error description
        error: String,
    },

    /// The response started but the body could not be read in full
    Truncated {
        /// Error description
        error: String,
    },
}

/// Fetch capability used by the crawl engine and the content extractor
///
/// Implementations must not panic on bad input; every failure is reported
/// through [`FetchResult`].
#[allow(async_fn_in_trait)]
pub trait Fetch {
    /// Fetches `url` with the given identity
    async fn fetch(&self, url: &str, identity: &Identity) -> FetchResult;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The network configuration
/// * `proxy` - SOCKS endpoint (`host:port`) to route through, if any
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use torcrawl::config::NetworkConfig;
/// use torcrawl::crawler::build_http_client;
///
/// let config = NetworkConfig::default();
/// let client = build_http_client(&config, Some(&config.tor_proxy)).unwrap();
/// ```
pub fn build_http_client(config: &NetworkConfig, proxy: Option<&str>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true);

    if let Some(endpoint) = proxy {
        // socks5h resolves hostnames on the proxy side, which .onion needs
        builder = builder.proxy(Proxy::all(format!("socks5h://{}", endpoint))?);
    }

    builder.build()
}

/// reqwest-backed fetcher
///
/// Holds one client for direct or Tor traffic and one client per rotation
/// proxy endpoint, all built up front.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    proxied: HashMap<String, Client>,
}

impl HttpFetcher {
    /// Creates a fetcher for the given transport settings
    ///
    /// # Arguments
    ///
    /// * `config` - The network configuration; `use_tor` routes the default
    ///   client through `tor_proxy`
    /// * `proxies` - Rotation endpoints that get their own client
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - All clients were built
    /// * `Err(reqwest::Error)` - A client could not be built
    pub fn new(config: &NetworkConfig, proxies: &[String]) -> Result<Self, reqwest::Error> {
        let default_proxy = config.use_tor.then_some(config.tor_proxy.as_str());
        let client = build_http_client(config, default_proxy)?;

        let mut proxied = HashMap::new();
        for endpoint in proxies {
            proxied.insert(endpoint.clone(), build_http_client(config, Some(endpoint))?);
        }

        tracing::debug!(
            "HTTP fetcher ready (tor: {}, rotation proxies: {})",
            config.use_tor,
            proxied.len()
        );

        Ok(Self { client, proxied })
    }

    fn client_for(&self, identity: &Identity) -> &Client {
        identity
            .proxy
            .as_ref()
            .and_then(|endpoint| self.proxied.get(endpoint))
            .unwrap_or(&self.client)
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str, identity: &Identity) -> FetchResult {
        fetch_url(self.client_for(identity), url, identity.user_agent.as_deref()).await
    }
}

/// Fetches a URL and classifies the outcome
///
/// # Error mapping
///
/// | Condition | Result |
/// |-----------|--------|
/// | Address does not parse / request cannot be built | `InvalidUrl` |
/// | Non-2xx status | `HttpError` |
/// | Timeout, connection refused, proxy failure | `NetworkError` |
/// | Body read fails midway | `Truncated` |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `user_agent` - Header override for this request
pub async fn fetch_url(client: &Client, url: &str, user_agent: Option<&str>) -> FetchResult {
    if let Err(e) = Url::parse(url) {
        return FetchResult::InvalidUrl {
            error: e.to_string(),
        };
    }

    let mut request = client.get(url);
    if let Some(agent) = user_agent {
        request = request.header(USER_AGENT, agent);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) if e.is_builder() => {
            return FetchResult::InvalidUrl {
                error: e.to_string(),
            }
        }
        Err(e) if e.is_timeout() => {
            return FetchResult::NetworkError {
                error: "Request timeout".to_string(),
            }
        }
        Err(e) if e.is_connect() => {
            return FetchResult::NetworkError {
                error: format!("Connection failed: {}", e),
            }
        }
        Err(e) => {
            return FetchResult::NetworkError {
                error: e.to_string(),
            }
        }
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().to_string();
    match response.bytes().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body: body.to_vec(),
        },
        Err(e) => FetchResult::Truncated {
            error: e.to_string(),
        },
    }
}
