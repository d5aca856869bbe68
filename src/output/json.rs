//! JSON export (`<prefix>_results.json`)

use crate::output::traits::{CrawlReport, Exporter, OutputResult};
use crate::state::CrawlResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn export(&self, result: &CrawlResult, dir: &Path, prefix: &str) -> OutputResult<Vec<PathBuf>> {
        let path = dir.join(format!("{}_results.json", prefix));
        let mut writer = BufWriter::new(File::create(&path)?);

        serde_json::to_writer_pretty(&mut writer, &CrawlReport::from_result(result))?;
        writer.flush()?;

        Ok(vec![path])
    }
}
