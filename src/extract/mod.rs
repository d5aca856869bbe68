//! Content extraction
//!
//! Fetches one address or a list of addresses and writes the raw bodies to
//! files, to a single output file, or to a writer (the terminal). An
//! optional rule set gates each item: content with no rule hit is skipped
//! with a "No matches in" notice.
//!
//! # Routing
//!
//! | Input | Destination |
//! |-------|-------------|
//! | address list | one file per address in a folder ([`ContentExtractor::to_folder`]) |
//! | address list | terminal ([`ContentExtractor::to_writer`]) |
//! | single address | named file ([`ContentExtractor::to_file`]) |
//! | single address | terminal ([`ContentExtractor::to_writer`]) |

mod rules;

pub use rules::{KeywordRules, RuleMatch, RuleMatcher};

use crate::crawler::{page_text, Fetch, FetchResult, IdentityPool};
use crate::url::canonicalize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// File name used when an address has no last path segment
pub const DEFAULT_FILE_NAME: &str = "index.htm";

/// Extraction errors
///
/// Per-address fetch failures are not errors; they are reported as
/// [`ExtractOutcome::Failed`].
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// What happened to one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// Body written to this file
    Written(PathBuf),

    /// Body written to the caller's writer
    Printed,

    /// Rule set reported no match; nothing written
    NoMatch,

    /// Fetch or write failed
    Failed(String),
}

/// Fetches content and persists or prints it
pub struct ContentExtractor<F: Fetch> {
    fetcher: F,
    rules: Option<Box<dyn RuleMatcher>>,
    text_only: bool,
    identities: IdentityPool,
    rotate_agent: bool,
    rotate_proxy: bool,
    rng: StdRng,
}

impl<F: Fetch> ContentExtractor<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            rules: None,
            text_only: false,
            identities: IdentityPool::empty(),
            rotate_agent: false,
            rotate_proxy: false,
            rng: StdRng::from_entropy(),
        }
    }

    /// Gates every item on at least one rule match
    pub fn with_rules(mut self, rules: Box<dyn RuleMatcher>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Matches and prints visible text instead of raw markup
    ///
    /// Files are always written with the raw body.
    pub fn text_only(mut self, text_only: bool) -> Self {
        self.text_only = text_only;
        self
    }

    /// Enables identity rotation from `pool`
    pub fn with_identities(mut self, pool: IdentityPool, rotate_agent: bool, rotate_proxy: bool) -> Self {
        self.identities = pool;
        self.rotate_agent = rotate_agent;
        self.rotate_proxy = rotate_proxy;
        self
    }

    /// Extracts every address into its own file under `folder`
    ///
    /// File names come from the last path segment of each address, with
    /// `(1)`, `(2)`, ... appended when the name is already taken.
    ///
    /// # Arguments
    ///
    /// * `addresses` - Addresses to fetch, in order
    /// * `folder` - Existing destination directory
    ///
    /// # Returns
    ///
    /// One outcome per address, in input order
    pub async fn to_folder(&mut self, addresses: &[String], folder: &Path) -> Vec<ExtractOutcome> {
        let mut outcomes = Vec::with_capacity(addresses.len());

        for address in addresses {
            let outcome = match self.fetch_gated(address).await {
                Ok(Some(body)) => {
                    let path = unique_path(folder, &file_name_for(address));
                    match std::fs::write(&path, &body) {
                        Ok(()) => {
                            tracing::info!("File created on: {}", path.display());
                            ExtractOutcome::Written(path)
                        }
                        Err(e) => {
                            tracing::error!("Can't write on file {}: {}", path.display(), e);
                            ExtractOutcome::Failed(e.to_string())
                        }
                    }
                }
                Ok(None) => ExtractOutcome::NoMatch,
                Err(message) => ExtractOutcome::Failed(message),
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Extracts one address into `path`
    ///
    /// # Returns
    ///
    /// * `Ok(ExtractOutcome)` - Written, no match, or a fetch failure
    /// * `Err(ExtractError)` - The file could not be written
    pub async fn to_file(&mut self, address: &str, path: &Path) -> Result<ExtractOutcome, ExtractError> {
        match self.fetch_gated(address).await {
            Ok(Some(body)) => {
                std::fs::write(path, &body)?;
                tracing::info!("File created on: {}", path.display());
                Ok(ExtractOutcome::Written(path.to_path_buf()))
            }
            Ok(None) => Ok(ExtractOutcome::NoMatch),
            Err(message) => Ok(ExtractOutcome::Failed(message)),
        }
    }

    /// Writes each address's content to `out`
    ///
    /// In text-only mode the visible text is written, otherwise the raw body.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ExtractOutcome>)` - One outcome per address
    /// * `Err(ExtractError)` - Writing to `out` failed
    pub async fn to_writer<W: Write>(
        &mut self,
        addresses: &[String],
        out: &mut W,
    ) -> Result<Vec<ExtractOutcome>, ExtractError> {
        let mut outcomes = Vec::with_capacity(addresses.len());

        for address in addresses {
            let outcome = match self.fetch_gated(address).await {
                Ok(Some(body)) => {
                    if self.text_only {
                        writeln!(out, "{}", page_text(&String::from_utf8_lossy(&body)))?;
                    } else {
                        out.write_all(&body)?;
                        writeln!(out)?;
                    }
                    ExtractOutcome::Printed
                }
                Ok(None) => ExtractOutcome::NoMatch,
                Err(message) => ExtractOutcome::Failed(message),
            };
            outcomes.push(outcome);
        }

        out.flush()?;
        Ok(outcomes)
    }

    /// Fetches an address and applies the rule gate
    ///
    /// `Ok(None)` means the rules found nothing; `Err` carries a
    /// human-readable failure.
    async fn fetch_gated(&mut self, raw: &str) -> Result<Option<Vec<u8>>, String> {
        let address = canonicalize(raw, false).map_err(|e| {
            tracing::warn!("Invalid address {}: {}", raw, e);
            e.to_string()
        })?;

        let identity = self
            .identities
            .draw(&mut self.rng, self.rotate_agent, self.rotate_proxy);

        let body = match self.fetcher.fetch(&address, &identity).await {
            FetchResult::Success { body, .. } => body,
            FetchResult::InvalidUrl { error } => {
                tracing::warn!("Invalid address {}: {}", address, error);
                return Err(format!("invalid address: {}", error));
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Error ({}) {}", status_code, address);
                return Err(format!("HTTP {}", status_code));
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Error ({}) {}", error, address);
                return Err(error);
            }
            FetchResult::Truncated { error } => {
                tracing::warn!("Incomplete read from {}: {}", address, error);
                return Err(format!("incomplete read: {}", error));
            }
        };

        if let Some(rules) = &self.rules {
            let raw_text = String::from_utf8_lossy(&body);
            let content = if self.text_only {
                page_text(&raw_text)
            } else {
                raw_text.into_owned()
            };

            let hits = rules.matches(&content);
            if hits.is_empty() {
                tracing::info!("No matches in: {}", address);
                return Ok(None);
            }
            for hit in &hits {
                tracing::debug!("Rule '{}' matched '{}' in {}", hit.rule, hit.matched, address);
            }
        }

        Ok(Some(body))
    }
}

/// Reads a line-delimited address list, skipping blank lines
pub fn read_address_list(path: &Path) -> Result<Vec<String>, ExtractError> {
    let content = std::fs::read_to_string(path)?;
    let addresses: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if addresses.is_empty() {
        return Err(ExtractError::InvalidInput(format!(
            "no addresses in {}",
            path.display()
        )));
    }
    Ok(addresses)
}

/// File name for an extracted address: its last path segment
///
/// # Examples
///
/// ```
/// use torcrawl::extract::file_name_for;
///
/// assert_eq!(file_name_for("http://example.com/docs/page.html?x=1"), "page.html");
/// assert_eq!(file_name_for("http://example.com/docs/"), "index.htm");
/// assert_eq!(file_name_for("http://example.com"), "index.htm");
/// ```
pub fn file_name_for(address: &str) -> String {
    let segment = match Url::parse(address.trim()) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string)
            .unwrap_or_default(),
        Err(_) => address
            .trim()
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .unwrap_or_default()
            .to_string(),
    };

    if segment.is_empty() || segment == "." || segment == ".." {
        DEFAULT_FILE_NAME.to_string()
    } else {
        segment
    }
}

/// Returns `folder/name`, or `folder/name(N)` for the lowest free N
pub fn unique_path(folder: &Path, name: &str) -> PathBuf {
    let candidate = folder.join(name);
    if !candidate.exists() {
        return candidate;
    }

    (1..)
        .map(|n| folder.join(format!("{}({})", name, n)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
