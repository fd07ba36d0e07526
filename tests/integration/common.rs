use crawlkeeper::config::{PolitenessConfig, UserAgentConfig};
use crawlkeeper::crawler::{CrawlOrchestrator, Fetcher, HttpFetcher};
use crawlkeeper::politeness::{MemoryRobotsCache, PolitenessGate};
use crawlkeeper::publish::{MemoryBroker, PartitionPublisher};
use crawlkeeper::storage::{ContentStore, FsBlobStore, SqliteMetadataStore};
use encoding_rs::{UTF_8, WINDOWS_1251};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const URLS_TOPIC: &str = "urls";
pub const SUMMARY_TOPIC: &str = "ranker";

pub fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

pub fn http_fetcher() -> Arc<dyn Fetcher> {
    Arc::new(
        HttpFetcher::from_config(&user_agent(), &PolitenessConfig::default())
            .expect("Failed to build HTTP client"),
    )
}

pub fn gate(fetcher: Arc<dyn Fetcher>, robots_ttl: Duration) -> PolitenessGate {
    PolitenessGate::new(
        fetcher,
        Arc::new(MemoryRobotsCache::new()),
        user_agent().crawler_name,
        robots_ttl,
    )
}

/// Opens a SQLite file and blob directory under `dir`
pub fn content_store(dir: &TempDir) -> ContentStore {
    let metadata = SqliteMetadataStore::new(&dir.path().join("pages.db"))
        .expect("Failed to open metadata store");
    ContentStore::new(
        Arc::new(metadata),
        Arc::new(FsBlobStore::new(dir.path().join("blobs"))),
    )
}

/// A full pipeline against real HTTP, real storage and a recording broker
pub struct Pipeline {
    pub orchestrator: Arc<CrawlOrchestrator>,
    pub broker: Arc<MemoryBroker>,
    pub dir: TempDir,
}

pub fn pipeline(max_batch_bytes: usize, partitions: i32) -> Pipeline {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let fetcher = http_fetcher();
    let broker = Arc::new(
        MemoryBroker::new(max_batch_bytes)
            .with_topic(URLS_TOPIC, partitions)
            .with_topic(SUMMARY_TOPIC, 1),
    );
    let publisher = PartitionPublisher::new(broker.clone(), URLS_TOPIC, SUMMARY_TOPIC);

    let orchestrator = CrawlOrchestrator::new(
        Arc::new(gate(fetcher.clone(), Duration::from_secs(3600))),
        fetcher,
        Arc::new(content_store(&dir)),
        Arc::new(publisher),
        vec![UTF_8, WINDOWS_1251],
    );

    Pipeline {
        orchestrator: Arc::new(orchestrator),
        broker,
        dir,
    }
}

/// Link values of every batch sent to the links topic, in send order
pub fn published_links(broker: &MemoryBroker) -> Vec<String> {
    broker
        .batches()
        .iter()
        .filter(|b| b.topic == URLS_TOPIC)
        .flat_map(|b| b.records.iter())
        .map(|r| String::from_utf8(r.value.clone()).expect("link is UTF-8"))
        .collect()
}
