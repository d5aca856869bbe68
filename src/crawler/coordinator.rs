//! Crawl engine - main crawl orchestration logic
//!
//! This module contains the traversal loop that coordinates all aspects of
//! a crawl, including:
//! - Walking the frontier pass by pass up to the configured depth
//! - Drawing a client identity for each fetch
//! - Coordinating fetching, parsing, and link extraction
//! - Recording everything found into the crawl result
//!
//! One item is handled at a time and every fetch is awaited before the next
//! one starts.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{Fetch, FetchResult};
use crate::crawler::identity::IdentityPool;
use crate::crawler::parser::parse_html;
use crate::crawler::patterns::PatternExtractor;
use crate::crawler::scheduler::Scheduler;
use crate::state::{CrawlResult, EngineState};
use crate::url::{canonicalize, resolve, Bucket, LinkClassifier};
use crate::{ConfigError, CrawlError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

/// Depth-bounded crawl over a single site
///
/// # Example
///
/// ```no_run
/// use torcrawl::config::{CrawlerConfig, NetworkConfig};
/// use torcrawl::{CrawlEngine, HttpFetcher};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpFetcher::new(&NetworkConfig::default(), &[])?;
/// let mut engine = CrawlEngine::new("torcrawl.com", &CrawlerConfig::default(), fetcher)?;
/// let visited = engine.crawl().await?;
/// println!("{} pages fetched, {} links found", visited.len(), engine.result().links().len());
/// # Ok(())
/// # }
/// ```
pub struct CrawlEngine<F: Fetch> {
    seed: String,
    depth: u32,
    fetcher: F,
    classifier: LinkClassifier,
    patterns: PatternExtractor,
    identities: IdentityPool,
    rotate_agent: bool,
    rotate_proxy: bool,
    rng: StdRng,
    scheduler: Scheduler,
    result: CrawlResult,
    state: EngineState,
}

impl<F: Fetch> CrawlEngine<F> {
    /// Creates an engine seeded with one address
    ///
    /// # Arguments
    ///
    /// * `seed` - Start address; a missing scheme becomes `https://`
    /// * `config` - Depth, pacing and pass mode
    /// * `fetcher` - The HTTP capability
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlEngine)` - Engine in the `Seeded` state
    /// * `Err(CrawlError)` - The seed is not a usable address
    pub fn new(seed: &str, config: &CrawlerConfig, fetcher: F) -> Result<Self, CrawlError> {
        let seed = canonicalize(seed, config.add_www)?;
        let classifier = LinkClassifier::new(&seed)?;

        let patterns = match &config.patterns_file {
            Some(path) => PatternExtractor::from_file(path),
            None => PatternExtractor::builtin(),
        };

        let pause = Duration::try_from_secs_f64(config.pause_seconds).map_err(|e| {
            ConfigError::Validation(format!(
                "pause_seconds {} is not a usable duration: {}",
                config.pause_seconds, e
            ))
        })?;

        Ok(Self {
            scheduler: Scheduler::new(&seed, pause, config.pass_mode),
            result: CrawlResult::new(&seed),
            seed,
            depth: config.depth,
            fetcher,
            classifier,
            patterns,
            identities: IdentityPool::empty(),
            rotate_agent: false,
            rotate_proxy: false,
            rng: StdRng::from_entropy(),
            state: EngineState::Seeded,
        })
    }

    /// Enables identity rotation from `pool`
    ///
    /// Rotation of a part with an empty pool falls back to the fetcher's
    /// default for that part.
    pub fn with_identities(mut self, pool: IdentityPool, rotate_agent: bool, rotate_proxy: bool) -> Self {
        self.identities = pool;
        self.rotate_agent = rotate_agent;
        self.rotate_proxy = rotate_proxy;
        self
    }

    /// Replaces the link patterns loaded from configuration
    pub fn with_patterns(mut self, patterns: PatternExtractor) -> Self {
        self.patterns = patterns;
        self
    }

    /// Makes identity draws reproducible
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// The canonical seed address
    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The accumulated result so far
    pub fn result(&self) -> &CrawlResult {
        &self.result
    }

    /// Consumes the engine, handing the result to exporters
    pub fn into_result(self) -> CrawlResult {
        self.result
    }

    fn transition(&mut self, next: EngineState) -> Result<(), CrawlError> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("Engine {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs the crawl to completion
    ///
    /// Per-item failures are logged and skipped. Running a finished engine
    /// again returns the same visit order without fetching anything.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - Addresses fetched, in order
    /// * `Err(CrawlError)` - The engine reached an inconsistent state
    pub async fn crawl(&mut self) -> Result<Vec<String>, CrawlError> {
        if self.state.is_terminal() {
            return Ok(self.result.visited().to_vec());
        }

        tracing::info!(
            "Crawler started from {} with {} step(s) and wait {:?}",
            self.seed,
            self.depth,
            self.scheduler.pause()
        );
        tracing::debug!(
            "Links outside {} are recorded, not followed",
            self.classifier.base_host()
        );

        for step in 1..=self.depth {
            self.scheduler.begin_pass();

            while let Some(item) = self.scheduler.next_item() {
                self.process_item(&item).await?;
                self.transition(EngineState::Advancing)?;

                if self.scheduler.has_more_in_pass() {
                    self.scheduler.pace().await;
                }
            }

            tracing::info!(
                "Step {} completed with {} results",
                step,
                self.result.links().len()
            );
            tracing::debug!(
                "{} of {} known address(es) fetched",
                self.scheduler.visited_count(),
                self.scheduler.frontier_size()
            );

            if self.scheduler.is_exhausted() && step < self.depth {
                tracing::debug!("Frontier exhausted after step {}", step);
                break;
            }
        }

        self.transition(EngineState::Done)?;
        Ok(self.result.visited().to_vec())
    }

    /// Fetches one item and admits what it links to
    ///
    /// Returns with the engine in `Fetching`, `Parsing` or `ExtractingLinks`;
    /// the caller moves it on to `Advancing`.
    async fn process_item(&mut self, item: &str) -> Result<(), CrawlError> {
        self.transition(EngineState::Fetching)?;

        let identity = self
            .identities
            .draw(&mut self.rng, self.rotate_agent, self.rotate_proxy);
        tracing::debug!("Processing URL: {}", item);
        self.result.record_visit(item);

        let (final_url, body) = match self.fetcher.fetch(item, &identity).await {
            FetchResult::Success {
                final_url, body, ..
            } => (final_url, body),
            FetchResult::InvalidUrl { error } => {
                tracing::warn!("Invalid address {}: {}", item, error);
                return Ok(());
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Skipping {}: HTTP {}", item, status_code);
                return Ok(());
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Host unreachable for {}: {}", item, error);
                return Ok(());
            }
            FetchResult::Truncated { error } => {
                tracing::warn!("Incomplete read from {}: {}", item, error);
                return Ok(());
            }
        };

        self.transition(EngineState::Parsing)?;
        let parsed = match parse_html(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Failed to parse HTML for {}: {}", item, e);
                return Ok(());
            }
        };

        self.transition(EngineState::ExtractingLinks)?;
        for link in &parsed.links {
            self.admit(item, &final_url, link);
        }
        for link in self.patterns.find_links(&parsed.text) {
            self.admit(item, &final_url, &link);
        }

        if let Some(title) = &parsed.title {
            self.result.record_title(item, title);
        }

        Ok(())
    }

    /// Classifies one link found on `source` and enqueues it when in scope
    fn admit(&mut self, source: &str, base: &str, link: &str) {
        if self.classifier.excludes(link, source, &mut self.result) {
            return;
        }

        let Some(address) = resolve(link, base) else {
            tracing::debug!("Could not resolve {} on {}", link, source);
            return;
        };

        // Protocol-relative and redirected links can still leave the site
        if !self.classifier.in_scope(&address) {
            self.result
                .record_resource(Bucket::ExternalLink, source, &address);
            return;
        }

        self.result.record_edge(source, &address);
        if self.scheduler.enqueue(&address) {
            tracing::trace!("Enqueued {}", address);
            self.result.record_link(&address);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PassMode;
    use crate::crawler::test_support::StaticFetcher;

    fn create_test_config(depth: u32) -> CrawlerConfig {
        CrawlerConfig {
            depth,
            patterns_file: None,
            ..CrawlerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_email_and_page_discovery() {
        let fetcher = StaticFetcher::new().page(
            "https://example.com",
            r#"<a href="/page1">p</a><a href="mailto:test@example.com">m</a>"#,
        );
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(1), fetcher).unwrap();

        engine.crawl().await.unwrap();
        let result = engine.result();

        assert!(result.contains_link("https://example.com"));
        assert!(result.contains_link("https://example.com/page1"));
        assert_eq!(result.bucket(Bucket::Email), ["test@example.com"]);
        assert_eq!(engine.state(), EngineState::Done);
    }

    #[tokio::test]
    async fn test_depth_zero_fetches_nothing() {
        let fetcher = StaticFetcher::new().page("https://example.com", "<a href=\"/a\">a</a>");
        let mut engine = CrawlEngine::new("example.com", &create_test_config(0), fetcher).unwrap();

        let visited = engine.crawl().await.unwrap();
        assert!(visited.is_empty());
        assert_eq!(engine.result().links(), ["https://example.com".to_string()]);
        assert!(engine.fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_growing_pass_processes_mid_pass_discoveries() {
        let fetcher = StaticFetcher::new()
            .page("https://example.com", r#"<a href="/a">a</a>"#)
            .page("https://example.com/a", r#"<a href="/b">b</a>"#)
            .page("https://example.com/b", "<p>end</p>");
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(1), fetcher).unwrap();

        let visited = engine.crawl().await.unwrap();
        assert_eq!(
            visited,
            [
                "https://example.com",
                "https://example.com/a",
                "https://example.com/b"
            ]
        );
    }

    #[tokio::test]
    async fn test_snapshot_pass_is_level_by_level() {
        let fetcher = StaticFetcher::new()
            .page("https://example.com", r#"<a href="/a">a</a>"#)
            .page("https://example.com/a", r#"<a href="/b">b</a>"#)
            .page("https://example.com/b", "<p>end</p>");
        let config = CrawlerConfig {
            pass_mode: PassMode::Snapshot,
            ..create_test_config(2)
        };
        let mut engine = CrawlEngine::new("https://example.com", &config, fetcher).unwrap();

        let visited = engine.crawl().await.unwrap();
        assert_eq!(visited, ["https://example.com", "https://example.com/a"]);
        assert!(engine.result().contains_link("https://example.com/b"));
    }

    #[tokio::test]
    async fn test_equivalent_addresses_fetched_once() {
        let fetcher = StaticFetcher::new().page(
            "https://example.com",
            r#"
                <a href="/a">1</a>
                <a href="/a/">2</a>
                <a href="https://www.example.com/a">3</a>
                <a href="https://EXAMPLE.com/a">4</a>
                <a href="/">self</a>
            "#,
        );
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(3), fetcher).unwrap();

        engine.crawl().await.unwrap();
        let requested = engine.fetcher.requested();
        assert_eq!(requested, ["https://example.com", "https://example.com/a"]);
    }

    #[tokio::test]
    async fn test_edges_recorded_for_known_targets() {
        let fetcher = StaticFetcher::new()
            .page("https://example.com", r#"<a href="/a">a</a>"#)
            .page("https://example.com/a", r#"<a href="/">home</a><a href="/a">me</a>"#);
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(2), fetcher).unwrap();

        engine.crawl().await.unwrap();
        let edges: Vec<(&str, &str)> = engine
            .result()
            .edges()
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();
        assert_eq!(
            edges,
            [
                ("https://example.com", "https://example.com/a"),
                ("https://example.com/a", "https://example.com/"),
                ("https://example.com/a", "https://example.com/a"),
            ]
        );
    }

    #[tokio::test]
    async fn test_every_enqueued_link_has_edge() {
        let fetcher = StaticFetcher::new()
            .page("https://example.com", r#"<a href="/a">a</a><a href="b.html">b</a>"#)
            .page("https://example.com/a", r#"<a href="//example.com/c">c</a>"#);
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(2), fetcher).unwrap();

        engine.crawl().await.unwrap();
        let result = engine.result();
        for link in result.links().iter().skip(1) {
            assert!(
                result.edges().iter().any(|e| &e.to == link),
                "no edge into {}",
                link
            );
        }
        assert_eq!(result.links().len(), 4);
    }

    #[tokio::test]
    async fn test_exclusions_never_enter_frontier() {
        let fetcher = StaticFetcher::new().page(
            "https://example.com",
            r##"
                <a href="#top">f</a>
                <a href="tel:+123">t</a>
                <a href="mailto:a@example.com">m</a>
                <a href="">empty</a>
                <a href="/logo.png">i</a>
                <a href="/app.js">s</a>
                <a href="/paper.pdf">d</a>
                <a href="https://other.com/x">x</a>
                <a href="//other.org/y">y</a>
            "##,
        );
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(1), fetcher).unwrap();

        engine.crawl().await.unwrap();
        let result = engine.result();
        assert_eq!(result.links(), ["https://example.com".to_string()]);
        assert_eq!(result.bucket(Bucket::Telephone), ["+123"]);
        assert_eq!(result.bucket(Bucket::Email), ["a@example.com"]);
        assert_eq!(result.bucket(Bucket::Image), ["/logo.png"]);
        assert_eq!(result.bucket(Bucket::Script), ["/app.js"]);
        assert_eq!(result.bucket(Bucket::File), ["/paper.pdf"]);
        assert_eq!(
            result.bucket(Bucket::ExternalLink),
            ["https://other.com/x", "https://other.org/y"]
        );
    }

    #[tokio::test]
    async fn test_image_on_other_host_is_image() {
        let fetcher = StaticFetcher::new().page(
            "https://example.com",
            r#"<a href="https://other.com/pic.png">p</a><a href="https://other.com/pic.png">again</a>"#,
        );
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(1), fetcher).unwrap();

        engine.crawl().await.unwrap();
        let result = engine.result();
        assert_eq!(result.bucket(Bucket::Image), ["https://other.com/pic.png"]);
        assert!(result.bucket(Bucket::ExternalLink).is_empty());
    }

    #[tokio::test]
    async fn test_pattern_discovery() {
        let fetcher = StaticFetcher::new()
            .page(
                "https://example.com",
                "<p>Mirror at https://example.com/hidden-page and www.other.com</p>",
            )
            .page("https://example.com/hidden-page", "<p>hidden</p>");
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(1), fetcher).unwrap();

        let visited = engine.crawl().await.unwrap();
        assert!(visited.contains(&"https://example.com/hidden-page".to_string()));
        assert_eq!(
            engine.result().bucket(Bucket::ExternalLink),
            ["https://www.other.com"]
        );
    }

    #[tokio::test]
    async fn test_encoded_ampersand_fetched_once() {
        let fetcher = StaticFetcher::new()
            .page(
                "https://example.com",
                r#"<a href="https://example.com/s?a=1&amp;b=2">search</a>"#,
            )
            .page("https://example.com/s?a=1&b=2", "<p>results</p>");
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(1), fetcher).unwrap();

        engine.crawl().await.unwrap();
        assert_eq!(
            engine.fetcher.requested(),
            ["https://example.com", "https://example.com/s?a=1&b=2"]
        );
        assert_eq!(engine.result().links().len(), 2);
    }

    #[tokio::test]
    async fn test_supplementary_patterns() {
        let fetcher = StaticFetcher::new()
            .page("https://example.com", "<pre>next: /archive/2019</pre>")
            .page("https://example.com/archive/2019", "<p>old</p>");
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(1), fetcher)
            .unwrap()
            .with_patterns(PatternExtractor::with_patterns([r"/archive/\d{4}"]));

        let visited = engine.crawl().await.unwrap();
        assert_eq!(visited.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_items_are_skipped() {
        let fetcher = StaticFetcher::new()
            .page(
                "https://example.com",
                r#"<a href="/gone">1</a><a href="/down">2</a><a href="/cut">3</a><a href="/bin">4</a><a href="/ok">5</a>"#,
            )
            .outcome(
                "https://example.com/down",
                FetchResult::NetworkError {
                    error: "refused".into(),
                },
            )
            .outcome(
                "https://example.com/cut",
                FetchResult::Truncated {
                    error: "eof".into(),
                },
            )
            .outcome(
                "https://example.com/bin",
                FetchResult::Success {
                    final_url: "https://example.com/bin".into(),
                    status_code: 200,
                    body: b"<a href=\"/never\">\x00".to_vec(),
                },
            )
            .page("https://example.com/ok", r#"<a href="/deeper">d</a>"#);
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(1), fetcher).unwrap();

        let visited = engine.crawl().await.unwrap();
        assert_eq!(visited.len(), 7);
        let result = engine.result();
        assert!(!result.contains_link("https://example.com/never"));
        assert!(result.contains_link("https://example.com/deeper"));
        assert_eq!(engine.state(), EngineState::Done);
    }

    #[tokio::test]
    async fn test_titles_recorded() {
        let fetcher = StaticFetcher::new().page(
            "https://example.com",
            "<html><head><title>Home</title></head><body></body></html>",
        );
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(1), fetcher).unwrap();

        engine.crawl().await.unwrap();
        assert_eq!(engine.result().title("https://example.com"), Some("Home"));
    }

    #[tokio::test]
    async fn test_identity_rotation() {
        let fetcher = StaticFetcher::new()
            .page("https://example.com", r#"<a href="/a">a</a>"#)
            .page("https://example.com/a", "<p>a</p>");
        let pool = IdentityPool::from_entries(vec!["Agent/1.0".into()], vec!["127.0.0.1:9150".into()]);
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(1), fetcher)
            .unwrap()
            .with_identities(pool, true, false)
            .with_rng_seed(1);

        engine.crawl().await.unwrap();
        for identity in engine.fetcher.identities() {
            assert_eq!(identity.user_agent.as_deref(), Some("Agent/1.0"));
            assert_eq!(identity.proxy, None);
        }
    }

    #[tokio::test]
    async fn test_crawl_twice_does_not_refetch() {
        let fetcher = StaticFetcher::new().page("https://example.com", "<p>x</p>");
        let mut engine = CrawlEngine::new("https://example.com", &create_test_config(1), fetcher).unwrap();

        let first = engine.crawl().await.unwrap();
        let second = engine.crawl().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.fetcher.requested().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_items_only() {
        let fetcher = StaticFetcher::new()
            .page("https://example.com", r#"<a href="/a">a</a><a href="/b">b</a>"#)
            .page("https://example.com/a", "<p>a</p>")
            .page("https://example.com/b", "<p>b</p>");
        let config = CrawlerConfig {
            pause_seconds: 10.0,
            ..create_test_config(1)
        };
        let mut engine = CrawlEngine::new("https://example.com", &config, fetcher).unwrap();

        let started = tokio::time::Instant::now();
        let visited = engine.crawl().await.unwrap();

        // Three items in the pass, so two pauses and none after the last
        assert_eq!(visited.len(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pause_at_pass_boundary() {
        let fetcher = StaticFetcher::new()
            .page("https://example.com", r#"<a href="/a">a</a><a href="/b">b</a>"#)
            .page("https://example.com/a", "<p>a</p>")
            .page("https://example.com/b", "<p>b</p>");
        let config = CrawlerConfig {
            pause_seconds: 10.0,
            pass_mode: PassMode::Snapshot,
            ..create_test_config(3)
        };
        let mut engine = CrawlEngine::new("https://example.com", &config, fetcher).unwrap();

        let started = tokio::time::Instant::now();
        let visited = engine.crawl().await.unwrap();

        // Pass one holds only the seed, pass two holds /a and /b
        assert_eq!(visited.len(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn test_unrepresentable_pause_is_config_error() {
        let config = CrawlerConfig {
            pause_seconds: 1e20,
            ..create_test_config(1)
        };
        let result = CrawlEngine::new("https://example.com", &config, StaticFetcher::new());
        assert!(matches!(result, Err(CrawlError::Config(ConfigError::Validation(_)))));
    }

    #[test]
    fn test_invalid_seed() {
        let result = CrawlEngine::new("ftp://example.com", &create_test_config(1), StaticFetcher::new());
        assert!(matches!(result, Err(CrawlError::UrlError(_))));
    }
}
