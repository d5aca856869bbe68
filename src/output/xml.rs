//! XML export (`<prefix>_results.xml`)
//!
//! ```xml
//! <crawl start_url="http://example.onion">
//!   <links>
//!     <link>http://example.onion</link>
//!   </links>
//!   <images/>
//! </crawl>
//! ```

use crate::output::traits::{CrawlReport, Exporter, OutputError, OutputResult};
use crate::state::CrawlResult;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlExporter;

impl Exporter for XmlExporter {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn export(&self, result: &CrawlResult, dir: &Path, prefix: &str) -> OutputResult<Vec<PathBuf>> {
        let path = dir.join(format!("{}_results.xml", prefix));
        let file = BufWriter::new(File::create(&path)?);

        let mut file = write_report(file, &CrawlReport::from_result(result))?;
        file.flush()?;

        Ok(vec![path])
    }
}

fn xml_error(e: impl Display) -> OutputError {
    OutputError::Format(e.to_string())
}

/// Serializes the report into `inner` and hands it back
pub fn write_report<W: Write>(inner: W, report: &CrawlReport) -> OutputResult<W> {
    let mut writer = Writer::new_with_indent(inner, b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;

    let mut root = BytesStart::new("crawl");
    root.push_attribute(("start_url", report.start_url.as_str()));
    writer.write_event(Event::Start(root)).map_err(xml_error)?;

    for (bucket, values) in report.sections() {
        if values.is_empty() {
            writer
                .write_event(Event::Empty(BytesStart::new(bucket.section())))
                .map_err(xml_error)?;
            continue;
        }

        writer
            .write_event(Event::Start(BytesStart::new(bucket.section())))
            .map_err(xml_error)?;
        for value in values {
            writer
                .write_event(Event::Start(BytesStart::new(bucket.element())))
                .map_err(xml_error)?;
            writer
                .write_event(Event::Text(BytesText::new(value)))
                .map_err(xml_error)?;
            writer
                .write_event(Event::End(BytesEnd::new(bucket.element())))
                .map_err(xml_error)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(bucket.section())))
            .map_err(xml_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("crawl")))
        .map_err(xml_error)?;

    Ok(writer.into_inner())
}
