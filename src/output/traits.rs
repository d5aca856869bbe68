//! Exporter trait and the serializable crawl report
//!
//! Exporters are read-only transforms over a finished [`CrawlResult`]; none
//! of them can change what a crawl found.

use crate::state::CrawlResult;
use crate::url::Bucket;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Flat, serializable view of a crawl
///
/// Bucket sections are listed in first-seen order; `resources` maps each
/// section to the pages values were found on.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub start_url: String,
    pub links: Vec<String>,
    pub external_links: Vec<String>,
    pub images: Vec<String>,
    pub scripts: Vec<String>,
    pub telephones: Vec<String>,
    pub emails: Vec<String>,
    pub files: Vec<String>,
    pub resources: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl CrawlReport {
    /// Builds the report for a finished crawl
    pub fn from_result(result: &CrawlResult) -> Self {
        let section = |bucket: Bucket| result.bucket(bucket).to_vec();

        let resources = result
            .resources()
            .iter()
            .map(|(bucket, pages)| {
                let pages = pages
                    .iter()
                    .map(|(source, values)| (source.clone(), values.iter().cloned().collect()))
                    .collect();
                (bucket.section().to_string(), pages)
            })
            .collect();

        Self {
            start_url: result.start_url().to_string(),
            links: section(Bucket::Link),
            external_links: section(Bucket::ExternalLink),
            images: section(Bucket::Image),
            scripts: section(Bucket::Script),
            telephones: section(Bucket::Telephone),
            emails: section(Bucket::Email),
            files: section(Bucket::File),
            resources,
        }
    }

    /// Values of one section, in `Bucket::ALL` order
    pub fn sections(&self) -> [(Bucket, &[String]); 7] {
        [
            (Bucket::Link, self.links.as_slice()),
            (Bucket::ExternalLink, self.external_links.as_slice()),
            (Bucket::Image, self.images.as_slice()),
            (Bucket::Script, self.scripts.as_slice()),
            (Bucket::Telephone, self.telephones.as_slice()),
            (Bucket::Email, self.emails.as_slice()),
            (Bucket::File, self.files.as_slice()),
        ]
    }
}

/// Trait for exporters
///
/// Each exporter writes one or more files into an existing directory, named
/// from the run prefix, and returns the paths it created.
pub trait Exporter {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Writes the crawl result
    ///
    /// # Arguments
    ///
    /// * `result` - The finished crawl
    /// * `dir` - Destination directory
    /// * `prefix` - Run prefix for file names
    fn export(&self, result: &CrawlResult, dir: &Path, prefix: &str) -> OutputResult<Vec<PathBuf>>;
}
