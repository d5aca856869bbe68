//! In-memory fetcher for engine and extractor unit tests

use crate::crawler::fetcher::{Fetch, FetchResult};
use crate::crawler::identity::Identity;
use std::cell::RefCell;
use std::collections::HashMap;

/// Serves canned responses keyed by exact address; anything else is a 404
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, FetchResult>,
    requests: RefCell<Vec<(String, Identity)>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `html` with status 200 at `url`
    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResult::Success {
                final_url: url.to_string(),
                status_code: 200,
                body: html.as_bytes().to_vec(),
            },
        );
        self
    }

    /// Serves a fixed outcome at `url`
    pub fn outcome(mut self, url: &str, result: FetchResult) -> Self {
        self.responses.insert(url.to_string(), result);
        self
    }

    /// Addresses requested so far, in order
    pub fn requested(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|(url, _)| url.clone()).collect()
    }

    /// Identities used so far, in order
    pub fn identities(&self) -> Vec<Identity> {
        self.requests.borrow().iter().map(|(_, id)| id.clone()).collect()
    }
}

impl Fetch for StaticFetcher {
    async fn fetch(&self, url: &str, identity: &Identity) -> FetchResult {
        self.requests
            .borrow_mut()
            .push((url.to_string(), identity.clone()));
        self.responses
            .get(url)
            .cloned()
            .unwrap_or(FetchResult::HttpError { status_code: 404 })
    }
}
