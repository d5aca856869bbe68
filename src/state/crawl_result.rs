use crate::url::{dedup_key, Bucket};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A directed link observation: `from`'s page referenced `to`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// Everything a crawl accumulated
///
/// Built empty when the engine is created, mutated only by the engine's
/// traversal loop, and handed to exporters read-only afterwards. Nothing is
/// ever removed during a run.
#[derive(Debug, Clone, Default)]
pub struct CrawlResult {
    start_url: String,

    /// In-scope addresses in discovery order, seed first
    links: Vec<String>,

    /// Addresses the engine attempted to fetch, in order
    visited: Vec<String>,

    /// Excluded values per bucket, in first-seen order
    findings: HashMap<Bucket, Vec<String>>,

    /// (bucket, dedup key) pairs already recorded this run
    seen_resources: HashSet<(Bucket, String)>,

    /// bucket -> source page -> values first seen on that page
    resources: BTreeMap<Bucket, BTreeMap<String, BTreeSet<String>>>,

    edges: Vec<Edge>,
    edge_set: HashSet<Edge>,

    titles: BTreeMap<String, String>,
}

impl CrawlResult {
    /// Creates an empty result for a crawl starting at `start_url`
    ///
    /// The start address is listed as the first link.
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            links: vec![start_url.to_string()],
            ..Default::default()
        }
    }

    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    /// Records a newly enqueued in-scope address
    pub fn record_link(&mut self, address: &str) {
        self.links.push(address.to_string());
    }

    /// Records that the engine dequeued `address` for fetching
    pub fn record_visit(&mut self, address: &str) {
        self.visited.push(address.to_string());
    }

    /// Records an edge; returns false if the exact pair was already known
    pub fn record_edge(&mut self, from: &str, to: &str) -> bool {
        let edge = Edge {
            from: from.to_string(),
            to: to.to_string(),
        };
        if !self.edge_set.insert(edge.clone()) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Records a page title the first time the page is seen
    pub fn record_title(&mut self, address: &str, title: &str) {
        self.titles
            .entry(address.to_string())
            .or_insert_with(|| title.to_string());
    }

    /// Records an excluded value under its source page
    ///
    /// Each distinct value (by dedup key) is stored once per run, under the
    /// page where it was first found.
    ///
    /// # Returns
    ///
    /// * `true` - The value was new and has been stored
    /// * `false` - The value was already known
    pub fn record_resource(&mut self, bucket: Bucket, source: &str, value: &str) -> bool {
        if !self.seen_resources.insert((bucket, dedup_key(value))) {
            return false;
        }

        tracing::debug!("Recorded {} on {}: {}", bucket.element(), source, value);
        self.findings
            .entry(bucket)
            .or_default()
            .push(value.to_string());
        self.resources
            .entry(bucket)
            .or_default()
            .entry(source.to_string())
            .or_default()
            .insert(value.to_string());
        true
    }

    /// In-scope addresses in discovery order
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Addresses dequeued for fetching, in order
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// Values recorded into a bucket; `Bucket::Link` returns the link list
    pub fn bucket(&self, bucket: Bucket) -> &[String] {
        match bucket {
            Bucket::Link => &self.links,
            other => self.findings.get(&other).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    /// Values of a bucket first found on `source`
    pub fn resources_for(&self, bucket: Bucket, source: &str) -> Vec<&str> {
        self.resources
            .get(&bucket)
            .and_then(|pages| pages.get(source))
            .map(|values| values.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// bucket -> source page -> values
    pub fn resources(&self) -> &BTreeMap<Bucket, BTreeMap<String, BTreeSet<String>>> {
        &self.resources
    }

    /// Link graph edges in observation order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn titles(&self) -> &BTreeMap<String, String> {
        &self.titles
    }

    pub fn title(&self, address: &str) -> Option<&str> {
        self.titles.get(address).map(String::as_str)
    }

    /// Returns true if `address` is a known in-scope link (exact form)
    pub fn contains_link(&self, address: &str) -> bool {
        self.links.iter().any(|link| link == address)
    }
}
