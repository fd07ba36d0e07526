//! Crawlkeeper main entry point
//!
//! This is the command-line interface that wires the crawl core together and serves
//! the HTTP entry point.

use anyhow::Context;
use clap::Parser;
use crawlkeeper::config::{load_config_with_hash, Config};
use crawlkeeper::crawler::{resolve_encodings, CrawlOrchestrator, Fetcher, HttpFetcher};
use crawlkeeper::politeness::{MemoryRobotsCache, PolitenessGate};
use crawlkeeper::publish::{KafkaBroker, PartitionPublisher};
use crawlkeeper::server;
use crawlkeeper::storage::open_content_store;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Crawlkeeper: the crawl core of a web-search ingestion pipeline
///
/// Accepts URLs over HTTP, checks robots.txt and content type, stores deduplicated
/// page content and publishes discovered links to Kafka.
#[derive(Parser, Debug)]
#[command(name = "crawlkeeper")]
#[command(version = "1.0.0")]
#[command(about = "A polite crawl worker", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config, print the effective settings and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.check_config {
        print_config(&config);
        return Ok(());
    }

    run(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG`, when set, overrides the flags.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("crawlkeeper=info,warn"),
                1 => EnvFilter::new("crawlkeeper=debug,info"),
                2 => EnvFilter::new("crawlkeeper=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn print_config(config: &Config) {
    println!("=== Crawlkeeper Configuration ===\n");

    println!("Server:");
    println!("  Bind address: {}", config.server.bind_address);

    println!("\nUser Agent:");
    println!("  Header: {}", config.user_agent.header_value());
    println!("  Robots token: {}", config.user_agent.crawler_name);

    println!("\nPoliteness:");
    println!(
        "  Robots cache TTL: {}s",
        config.politeness.robots_cache_ttl_secs
    );
    println!(
        "  Request timeout: {}s (connect {}s)",
        config.politeness.request_timeout_secs, config.politeness.connect_timeout_secs
    );

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);
    println!("  Blobs: {}", config.storage.blob_dir);

    println!("\nBroker:");
    println!("  Bootstrap servers: {}", config.broker.bootstrap_servers);
    println!(
        "  Topics: {} (links), {} (summaries)",
        config.broker.urls_topic, config.broker.summary_topic
    );
    println!("  Max batch bytes: {}", config.broker.max_batch_bytes);

    println!("\nCrawler:");
    println!(
        "  Fallback encodings: {}",
        config.crawler.fallback_encodings.join(", ")
    );

    println!("\n✓ Configuration is valid");
}

/// Builds every component, serves until ctrl-c and flushes the producer
async fn run(config: Config) -> anyhow::Result<()> {
    let fetcher: Arc<dyn Fetcher> = Arc::new(
        HttpFetcher::from_config(&config.user_agent, &config.politeness)
            .context("Failed to build HTTP client")?,
    );

    let gate = PolitenessGate::new(
        fetcher.clone(),
        Arc::new(MemoryRobotsCache::new()),
        config.user_agent.crawler_name.clone(),
        config.politeness.robots_cache_ttl(),
    );

    let store = open_content_store(&config.storage).context("Failed to open storage")?;

    let broker = Arc::new(
        KafkaBroker::connect_with_retry(&config.broker)
            .await
            .context("Failed to connect to Kafka")?,
    );
    let publisher = PartitionPublisher::new(
        broker.clone(),
        config.broker.urls_topic.clone(),
        config.broker.summary_topic.clone(),
    );

    let orchestrator = Arc::new(CrawlOrchestrator::new(
        Arc::new(gate),
        fetcher,
        Arc::new(store),
        Arc::new(publisher),
        resolve_encodings(&config.crawler.fallback_encodings),
    ));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind_address))?;
    tracing::info!("Listening on {}", config.server.bind_address);

    server::serve(listener, server::router(orchestrator))
        .await
        .context("Server error")?;

    if let Err(e) = broker.flush().await {
        tracing::warn!("Failed to flush pending Kafka messages: {}", e);
    }
    tracing::info!("Shut down cleanly");

    Ok(())
}
