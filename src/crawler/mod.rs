//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching through Tor or rotation proxies
//! - Checking the public exit address
//! - HTML parsing and link extraction
//! - Regex-based discovery of links outside anchor tags
//! - Frontier scheduling and pacing
//! - Overall crawl coordination

mod checker;
mod coordinator;
mod fetcher;
mod identity;
mod parser;
mod patterns;
mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

pub use checker::{exit_ip, CheckError};
pub use coordinator::CrawlEngine;
pub use fetcher::{build_http_client, fetch_url, Fetch, FetchResult, HttpFetcher};
pub use identity::{Identity, IdentityPool};
pub use parser::{page_text, parse_html, ParsedPage};
pub use patterns::PatternExtractor;
pub use scheduler::Scheduler;
