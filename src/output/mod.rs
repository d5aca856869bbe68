//! Output module for exporting crawl results
//!
//! This module handles:
//! - Preparing the per-site output directory
//! - Naming output files after the run timestamp
//! - Exporting a finished crawl as text, JSON, XML or SQLite

mod json;
mod sqlite;
mod text;
mod traits;
mod xml;

pub use json::JsonExporter;
pub use sqlite::SqliteExporter;
pub use text::{write_lines, TextExporter};
pub use traits::{CrawlReport, Exporter, OutputError, OutputResult};
pub use xml::XmlExporter;

use crate::config::ExportFormat;
use crate::state::CrawlResult;
use std::path::{Path, PathBuf};
use url::Url;

/// Returns the exporter for a format
pub fn exporter_for(format: ExportFormat, log_visited: bool) -> Box<dyn Exporter> {
    match format {
        ExportFormat::Text => Box::new(TextExporter::new(log_visited)),
        ExportFormat::Json => Box::new(JsonExporter),
        ExportFormat::Xml => Box::new(XmlExporter),
        ExportFormat::Sqlite => Box::new(SqliteExporter),
    }
}

/// Runs every requested exporter over a finished crawl
///
/// Repeated formats are exported once.
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Every file written, in format order
/// * `Err(OutputError)` - The first exporter that failed
pub fn export_all(
    result: &CrawlResult,
    dir: &Path,
    prefix: &str,
    formats: &[ExportFormat],
    log_visited: bool,
) -> OutputResult<Vec<PathBuf>> {
    let mut done = Vec::with_capacity(formats.len());
    let mut written = Vec::new();

    for format in formats {
        if done.contains(format) {
            continue;
        }
        done.push(*format);

        let exporter = exporter_for(*format, log_visited);
        let paths = exporter.export(result, dir, prefix)?;
        tracing::info!("{} export wrote {} file(s)", exporter.name(), paths.len());
        written.extend(paths);
    }

    Ok(written)
}

/// Directory name for an address: its host, or the raw input without a scheme
pub fn site_folder_name(address: &str) -> String {
    let trimmed = address.trim();
    match Url::parse(trimmed) {
        Ok(url) => match url.host_str() {
            Some(host) => host.to_string(),
            None => trimmed.trim_end_matches('/').to_string(),
        },
        Err(_) => trimmed.trim_end_matches('/').to_string(),
    }
}

/// Creates `<base>/<host>` and returns it
///
/// # Arguments
///
/// * `base` - Root output directory
/// * `address` - The seed address or input name the run is for
pub fn prepare_output_dir(base: &Path, address: &str) -> std::io::Result<PathBuf> {
    let dir = base.join(site_folder_name(address));
    std::fs::create_dir_all(&dir)?;
    tracing::debug!("Output directory: {}", dir.display());
    Ok(dir)
}

/// Timestamp prefix for this run's output files
pub fn run_prefix() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}
