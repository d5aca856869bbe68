//! TorCrawl main entry point
//!
//! This is the command-line interface for the TorCrawl crawler and content
//! extractor.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use torcrawl::config::{load_config_with_hash, validate, Config, ExportFormat, PassMode};
use torcrawl::crawler::{exit_ip, CrawlEngine, HttpFetcher, IdentityPool};
use torcrawl::extract::{read_address_list, ContentExtractor, ExtractOutcome, KeywordRules};
use torcrawl::output::{export_all, prepare_output_dir, run_prefix};
use tracing_subscriber::EnvFilter;

/// TorCrawl: crawl and extract sites through Tor
///
/// Crawls a single site up to a given depth, sorting every link it finds
/// into pages, external links and resources, and extracts page content to
/// files or the terminal.
#[derive(Parser, Debug)]
#[command(name = "torcrawl")]
#[command(version)]
#[command(about = "Crawl and extract sites through Tor", long_about = None)]
struct Cli {
    /// Seed address (a missing scheme becomes https://)
    #[arg(short, long)]
    url: Option<String>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Connect directly instead of through the Tor proxy
    #[arg(short, long)]
    without: bool,

    /// Extract page content
    #[arg(short, long)]
    extract: bool,

    /// File with one address per line to extract
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file name for a single extracted address
    #[arg(short, long, value_name = "NAME")]
    output: Option<String>,

    /// Crawl the site
    #[arg(short, long)]
    crawl: bool,

    /// Number of passes over the frontier
    #[arg(short, long)]
    depth: Option<u32>,

    /// Pause between requests, in seconds
    #[arg(short, long, value_name = "SECS")]
    pause: Option<f64>,

    /// Write the visit order to a log file
    #[arg(short, long)]
    log: bool,

    /// Export format for crawl results (repeatable)
    #[arg(short = 'x', long = "export", value_enum, value_name = "FORMAT")]
    export: Vec<ExportFormat>,

    /// Gate extracted content on rule matches, against raw markup or visible text
    #[arg(short = 'y', long = "yara", value_enum, value_name = "MODE")]
    yara: Option<RuleMode>,

    /// TOML rule file used with --yara
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Pick a random user agent for every request
    #[arg(long)]
    random_agent: bool,

    /// Pick a random SOCKS proxy for every request
    #[arg(long)]
    random_proxy: bool,

    /// User-agent pool file
    #[arg(long, value_name = "FILE")]
    user_agents: Option<PathBuf>,

    /// Proxy pool file (host:port per line)
    #[arg(long, value_name = "FILE")]
    proxies: Option<PathBuf>,

    /// Supplementary link pattern file
    #[arg(long, value_name = "FILE")]
    patterns: Option<PathBuf>,

    /// Prefix www. on a seed given without scheme
    #[arg(long)]
    add_www: bool,

    /// Bound each pass to the frontier it started with
    #[arg(long)]
    strict_depth: bool,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RuleMode {
    Raw,
    Text,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_cli_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;
    check_rule_gating(&config, &cli)?;

    if !config.network.use_tor {
        tracing::warn!("Tor proxy disabled; requests go out directly");
    }

    let identities = IdentityPool::load(
        config
            .network
            .random_user_agent
            .then_some(config.network.user_agents_file.as_path()),
        config
            .network
            .random_proxy
            .then_some(config.network.proxies_file.as_path()),
    );
    let fetcher = HttpFetcher::new(&config.network, identities.proxies())
        .context("Failed to build HTTP client")?;

    if cli.verbose > 0 {
        report_exit_ip(&config, &fetcher).await?;
    }

    let extractor = build_extractor(&config, fetcher.clone(), identities.clone())?;

    if cli.crawl {
        let Some(url) = cli.url.as_deref() else {
            bail!("--crawl needs a seed address (--url)");
        };
        handle_crawl(&config, &cli, url, fetcher, identities, extractor).await
    } else {
        handle_extract(&config, &cli, extractor).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("torcrawl=info,warn"),
            1 => EnvFilter::new("torcrawl=debug,info"),
            _ => EnvFilter::new("torcrawl=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line flags on top of the loaded configuration
fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(depth) = cli.depth {
        config.crawler.depth = depth;
    }
    if let Some(pause) = cli.pause {
        config.crawler.pause_seconds = pause;
    }
    if cli.strict_depth {
        config.crawler.pass_mode = PassMode::Snapshot;
    }
    if cli.add_www {
        config.crawler.add_www = true;
    }
    if let Some(path) = &cli.patterns {
        config.crawler.patterns_file = Some(path.clone());
    }

    if cli.without {
        config.network.use_tor = false;
    }
    if cli.random_agent {
        config.network.random_user_agent = true;
    }
    if cli.random_proxy {
        config.network.random_proxy = true;
    }
    if let Some(path) = &cli.user_agents {
        config.network.user_agents_file = path.clone();
    }
    if let Some(path) = &cli.proxies {
        config.network.proxies_file = path.clone();
    }

    if !cli.export.is_empty() {
        config.output.formats = cli.export.clone();
    }
    if cli.log {
        config.output.log_visited = true;
    }

    if let Some(mode) = cli.yara {
        config.extract.text_only = mode == RuleMode::Text;
    }
    if let Some(path) = &cli.rules {
        config.extract.rules_file = Some(path.clone());
    }
}

/// Rejects `--yara` when no rule file is configured
fn check_rule_gating(config: &Config, cli: &Cli) -> anyhow::Result<()> {
    if cli.yara.is_some() && config.extract.rules_file.is_none() {
        bail!("--yara needs a rule file (--rules or extract.rules-file in the config)");
    }
    Ok(())
}

/// Logs the public address requests leave from
///
/// A failed check through Tor means the proxy is down and stops the run.
async fn report_exit_ip(config: &Config, fetcher: &HttpFetcher) -> anyhow::Result<()> {
    match exit_ip(fetcher, &config.network.ip_check_url).await {
        Ok(ip) => tracing::info!("Your IP: {}", ip),
        Err(e) if config.network.use_tor && e.is_unreachable() => {
            bail!(
                "Tor proxy at {} cannot be reached: {}",
                config.network.tor_proxy,
                e
            );
        }
        Err(e) => tracing::warn!("IP cannot be obtained: {}", e),
    }
    Ok(())
}

fn build_extractor(
    config: &Config,
    fetcher: HttpFetcher,
    identities: IdentityPool,
) -> anyhow::Result<ContentExtractor<HttpFetcher>> {
    let mut extractor = ContentExtractor::new(fetcher)
        .text_only(config.extract.text_only)
        .with_identities(
            identities,
            config.network.random_user_agent,
            config.network.random_proxy,
        );

    if let Some(path) = &config.extract.rules_file {
        let rules = KeywordRules::load(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?;
        tracing::info!("Loaded {} rule(s) from {}", rules.len(), path.display());
        extractor = extractor.with_rules(Box::new(rules));
    }

    Ok(extractor)
}

/// Crawls from `url`, exports the result and optionally extracts every link
async fn handle_crawl(
    config: &Config,
    cli: &Cli,
    url: &str,
    fetcher: HttpFetcher,
    identities: IdentityPool,
    mut extractor: ContentExtractor<HttpFetcher>,
) -> anyhow::Result<()> {
    let mut engine = CrawlEngine::new(url, &config.crawler, fetcher)?.with_identities(
        identities,
        config.network.random_user_agent,
        config.network.random_proxy,
    );

    let out_dir = prepare_output_dir(&config.output.directory, engine.seed())
        .context("Failed to create output directory")?;
    tracing::info!("Output path: {}", out_dir.display());

    let visited = engine.crawl().await?;
    let result = engine.into_result();
    tracing::info!(
        "Crawl finished: {} page(s) fetched, {} link(s) found",
        visited.len(),
        result.links().len()
    );

    let written = export_all(
        &result,
        &out_dir,
        &run_prefix(),
        &config.output.formats,
        config.output.log_visited,
    )?;
    for path in &written {
        tracing::info!("File created on: {}", path.display());
    }

    if cli.extract {
        let outcomes = extractor.to_folder(result.links(), &out_dir).await;
        report_outcomes(&outcomes);
    }

    Ok(())
}

/// Extracts a single address or an input list without crawling
async fn handle_extract(
    config: &Config,
    cli: &Cli,
    mut extractor: ContentExtractor<HttpFetcher>,
) -> anyhow::Result<()> {
    if let Some(input) = &cli.input {
        let addresses = read_address_list(input)
            .with_context(|| format!("Failed to read input list {}", input.display()))?;
        let outcomes = extractor
            .to_writer(&addresses, &mut std::io::stdout())
            .await?;
        report_outcomes(&outcomes);
        return Ok(());
    }

    let Some(url) = cli.url.as_deref() else {
        bail!("Nothing to do: pass --url or --input");
    };

    match &cli.output {
        Some(name) => {
            let out_dir = prepare_output_dir(&config.output.directory, url)
                .context("Failed to create output directory")?;
            let outcome = extractor.to_file(url, &out_dir.join(Path::new(name))).await?;
            report_outcomes(std::slice::from_ref(&outcome));
        }
        None => {
            let outcomes = extractor
                .to_writer(&[url.to_string()], &mut std::io::stdout())
                .await?;
            report_outcomes(&outcomes);
        }
    }

    Ok(())
}

fn report_outcomes(outcomes: &[ExtractOutcome]) {
    let written = outcomes
        .iter()
        .filter(|o| matches!(o, ExtractOutcome::Written(_) | ExtractOutcome::Printed))
        .count();
    let skipped = outcomes
        .iter()
        .filter(|o| matches!(o, ExtractOutcome::NoMatch))
        .count();
    let failed = outcomes.len() - written - skipped;

    tracing::info!(
        "Extraction done: {} written, {} without matches, {} failed",
        written,
        skipped,
        failed
    );
}
