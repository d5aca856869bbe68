//! SQLite export (`<prefix>_results.db`)
//!
//! The crawl graph is stored as a node table keyed by URL, an edge table, and
//! a table of every bucketed value with the page it was found on.

use crate::output::traits::{Exporter, OutputResult};
use crate::state::CrawlResult;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// SQL schema for the export database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    url TEXT PRIMARY KEY,
    title TEXT
);

CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_url TEXT NOT NULL REFERENCES nodes(url),
    to_url TEXT NOT NULL REFERENCES nodes(url)
);

CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(from_url);
CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_url);

CREATE TABLE IF NOT EXISTS resources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    from_url TEXT NOT NULL,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_resources_category ON resources(category);
"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteExporter;

impl Exporter for SqliteExporter {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn export(&self, result: &CrawlResult, dir: &Path, prefix: &str) -> OutputResult<Vec<PathBuf>> {
        let path = dir.join(format!("{}_results.db", prefix));
        if path.exists() {
            std::fs::remove_file(&path)?;
        }

        let mut conn = Connection::open(&path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        write_graph(&mut conn, result)?;

        Ok(vec![path])
    }
}

/// Writes nodes, edges and resources in a single transaction
fn write_graph(conn: &mut Connection, result: &CrawlResult) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    {
        let mut insert_node =
            tx.prepare("INSERT OR IGNORE INTO nodes (url, title) VALUES (?1, ?2)")?;

        let endpoints = result
            .edges()
            .iter()
            .flat_map(|edge| [edge.from.as_str(), edge.to.as_str()]);
        for url in result.links().iter().map(String::as_str).chain(endpoints) {
            insert_node.execute(params![url, result.title(url)])?;
        }

        let mut insert_edge = tx.prepare("INSERT INTO edges (from_url, to_url) VALUES (?1, ?2)")?;
        for edge in result.edges() {
            insert_edge.execute(params![edge.from, edge.to])?;
        }

        let mut insert_resource =
            tx.prepare("INSERT INTO resources (category, from_url, value) VALUES (?1, ?2, ?3)")?;
        for (bucket, pages) in result.resources() {
            for (source, values) in pages {
                for value in values {
                    insert_resource.execute(params![bucket.section(), source, value])?;
                }
            }
        }
    }
    tx.commit()
}
