//! DocHarvest main entry point
//!
//! Command-line interface for crawling a documentation site into an
//! in-memory corpus with quality findings and crawl statistics.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docharvest::backend::{BackendCriteria, BackendRegistry, FileBackend, HttpBackend};
use docharvest::config::{load_config_with_hash, Config};
use docharvest::processor::{BasicQualityChecker, HtmlProcessor, MemoryOrganizer};
use docharvest::{CrawlOrchestrator, CrawlResult, CrawlTarget};

/// DocHarvest: a documentation site crawler
///
/// Crawls a documentation site breadth-first from a seed URL, filters
/// discovered links to the target's scope, and reports the collected
/// documents with quality findings.
#[derive(Parser, Debug)]
#[command(name = "docharvest")]
#[command(version)]
#[command(about = "A documentation site crawler", long_about = None)]
struct Cli {
    /// Seed URL to crawl from
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum link depth from the seed (0 = seed only)
    #[arg(short, long, default_value_t = 2)]
    depth: u32,

    /// Follow links outside the seed's domain
    #[arg(long)]
    follow_external: bool,

    /// Accepted content type (repeatable)
    #[arg(long = "content-type", value_name = "TYPE")]
    content_types: Vec<String>,

    /// Regex that rejects matching URLs (repeatable, wins over --include)
    #[arg(long = "exclude", value_name = "PATTERN")]
    exclude_patterns: Vec<String>,

    /// Regex a URL must match when any are given (repeatable)
    #[arg(long = "include", value_name = "PATTERN")]
    include_patterns: Vec<String>,

    /// Upper bound on pages crawled
    #[arg(long, default_value_t = 100)]
    max_pages: u32,

    /// Path prefix a URL must start with when any are given (repeatable)
    #[arg(long = "allowed-path", value_name = "PREFIX")]
    allowed_paths: Vec<String>,

    /// Path prefix that rejects matching URLs (repeatable)
    #[arg(long = "excluded-path", value_name = "PREFIX")]
    excluded_paths: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let target = build_target(&cli);

    if cli.dry_run {
        handle_dry_run(&config, &target);
        return Ok(());
    }

    let registry = Arc::new(build_registry(&config)?);
    let orchestrator = CrawlOrchestrator::new(
        config,
        Arc::clone(&registry),
        Arc::new(HtmlProcessor::new()),
        Arc::new(BasicQualityChecker::default()),
        Arc::new(MemoryOrganizer::new()),
    );

    let outcome = orchestrator.crawl(&target).await;
    registry.close_all().await;
    let result = outcome.context("crawl failed")?;

    print_summary(&result);
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docharvest=info,warn"),
            1 => EnvFilter::new("docharvest=debug,info"),
            2 => EnvFilter::new("docharvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn build_target(cli: &Cli) -> CrawlTarget {
    let mut target = CrawlTarget::new(&cli.url, cli.depth);
    target.follow_external = cli.follow_external;
    target.max_pages = cli.max_pages;
    if !cli.content_types.is_empty() {
        target.content_types = cli.content_types.clone();
    }
    target.exclude_patterns = cli.exclude_patterns.clone();
    target.include_patterns = cli.include_patterns.clone();
    target.allowed_paths = cli.allowed_paths.clone();
    target.excluded_paths = cli.excluded_paths.clone();
    target
}

/// Registers the built-in backends: HTTP for web targets, file for
/// locally checked-out docs trees
fn build_registry(config: &Config) -> anyhow::Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();

    let http = HttpBackend::new(&config.user_agent.full_agent())
        .context("failed to build HTTP backend")?;
    registry
        .register(
            "http",
            Arc::new(http),
            BackendCriteria {
                priority: 10,
                url_patterns: vec!["^https?://".to_string()],
                ..Default::default()
            },
        )
        .context("failed to register HTTP backend")?;

    registry
        .register(
            "file",
            Arc::new(FileBackend::new()),
            BackendCriteria {
                priority: 10,
                url_patterns: vec!["^file://".to_string()],
                ..Default::default()
            },
        )
        .context("failed to register file backend")?;

    Ok(registry)
}

/// Handles the --dry-run mode: validates config and shows the crawl scope
fn handle_dry_run(config: &Config, target: &CrawlTarget) {
    println!("=== DocHarvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Concurrent requests: {}",
        config.crawler.concurrent_requests
    );
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );
    println!("  Rate limit: {}s between requests", config.crawler.rate_limit_secs);
    println!("  Max retries: {}", config.crawler.max_retries);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.full_agent());

    println!("\nTarget:");
    println!("  Seed: {}", target.url);
    println!("  Depth: {}", target.depth);
    println!("  Max pages: {}", target.max_pages);
    println!("  Follow external: {}", target.follow_external);
    println!("  Content types: {}", target.content_types.join(", "));
    if !target.exclude_patterns.is_empty() {
        println!("  Exclude patterns: {}", target.exclude_patterns.join(", "));
    }
    if !target.include_patterns.is_empty() {
        println!("  Include patterns: {}", target.include_patterns.join(", "));
    }
    if !target.allowed_paths.is_empty() {
        println!("  Allowed paths: {}", target.allowed_paths.join(", "));
    }
    if !target.excluded_paths.is_empty() {
        println!("  Excluded paths: {}", target.excluded_paths.join(", "));
    }

    match target.validate() {
        Ok(()) => println!("\n✓ Configuration is valid"),
        Err(e) => println!("\n✗ Invalid target: {}", e),
    }
}

fn print_summary(result: &CrawlResult) {
    println!("\n=== Crawl Summary ===");
    println!("Pages crawled: {}", result.stats.pages_crawled);
    println!("Failures: {}", result.stats.failed_crawls);
    println!("Quality findings: {}", result.stats.quality_issues);
    println!(
        "Total time: {:.2}s (avg {:.2}s/page)",
        result.stats.total_time.as_secs_f64(),
        result.stats.average_time_per_page.as_secs_f64()
    );

    if let Some(structure) = &result.structure {
        println!("\nCorpus: {}", structure.summary);
        for (document, title) in result.documents.iter().zip(&structure.titles) {
            println!("  [{}] {} - {}", document.doc_id, title, document.url);
        }
    }

    if !result.failed_urls.is_empty() {
        println!("\nFailed URLs:");
        for url in &result.failed_urls {
            let detail = result.errors.get(url).map(String::as_str).unwrap_or("");
            println!("  {} ({})", url, detail);
        }
    }
}
