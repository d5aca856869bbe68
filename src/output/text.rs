//! Line-delimited text export
//!
//! Writes `<prefix>_links.txt` plus one file per non-empty bucket, and the
//! visit log when enabled.

use crate::output::traits::{CrawlReport, Exporter, OutputResult};
use crate::state::CrawlResult;
use crate::url::Bucket;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Text exporter
#[derive(Debug, Clone, Default)]
pub struct TextExporter {
    /// Also write `<prefix>_log.txt` with the visit order
    pub log_visited: bool,
}

impl TextExporter {
    pub fn new(log_visited: bool) -> Self {
        Self { log_visited }
    }
}

impl Exporter for TextExporter {
    fn name(&self) -> &'static str {
        "text"
    }

    fn export(&self, result: &CrawlResult, dir: &Path, prefix: &str) -> OutputResult<Vec<PathBuf>> {
        let report = CrawlReport::from_result(result);
        let mut written = Vec::new();

        for (bucket, values) in report.sections() {
            // The link list is always written, even for a crawl that found nothing
            if values.is_empty() && bucket != Bucket::Link {
                continue;
            }
            let path = dir.join(format!("{}_{}.txt", prefix, bucket.section()));
            write_lines(&path, values)?;
            written.push(path);
        }

        if self.log_visited {
            let path = dir.join(format!("{}_log.txt", prefix));
            write_lines(&path, result.visited())?;
            written.push(path);
        }

        Ok(written)
    }
}

/// Writes one value per line
pub fn write_lines(path: &Path, lines: &[String]) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_links_and_non_empty_buckets() {
        let dir = TempDir::new().unwrap();
        let mut result = CrawlResult::new("https://torcrawl.com");
        result.record_link("https://torcrawl.com/about");
        result.record_resource(Bucket::Telephone, "https://torcrawl.com", "012-013-104-5");

        let written = TextExporter::new(false)
            .export(&result, dir.path(), "20240101120000")
            .unwrap();

        assert_eq!(
            written,
            vec![
                dir.path().join("20240101120000_links.txt"),
                dir.path().join("20240101120000_telephones.txt"),
            ]
        );
        let links = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(links, "https://torcrawl.com\nhttps://torcrawl.com/about\n");
        let phones = std::fs::read_to_string(&written[1]).unwrap();
        assert_eq!(phones, "012-013-104-5\n");
    }

    #[test]
    fn test_visit_log() {
        let dir = TempDir::new().unwrap();
        let mut result = CrawlResult::new("https://torcrawl.com");
        result.record_visit("https://torcrawl.com");

        let written = TextExporter::new(true)
            .export(&result, dir.path(), "run")
            .unwrap();

        let log = dir.path().join("run_log.txt");
        assert!(written.contains(&log));
        assert_eq!(std::fs::read_to_string(log).unwrap(), "https://torcrawl.com\n");
    }
}
