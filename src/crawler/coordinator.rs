//! Crawl orchestration - the per-URL pipeline
//!
//! A crawl runs: permission check, fetch, charset negotiation, parse, link
//! normalization, content upsert, summary publish, link publish. The first failing
//! step aborts the rest; nothing is retried here.

use crate::crawler::{decode_body, parse_html, Fetcher};
use crate::politeness::PolitenessGate;
use crate::publish::PartitionPublisher;
use crate::storage::{ContentHash, ContentStore};
use crate::url::normalize_links;
use crate::CrawlError;
use chrono::Utc;
use encoding_rs::Encoding;
use std::sync::Arc;
use url::Url;

/// Result of a crawl that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Stored and published
    Crawled {
        hash: ContentHash,
        title: Option<String>,
        links: Vec<String>,
    },
    /// Rejected by the politeness gate
    Disallowed,
    /// The page answered with a non-2xx status
    BadStatus { status: u16 },
    /// No candidate charset decodes the body
    Undecodable,
}

/// Composes the politeness gate, fetcher, content store and publisher
pub struct CrawlOrchestrator {
    gate: Arc<PolitenessGate>,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<ContentStore>,
    publisher: Arc<PartitionPublisher>,
    fallback_encodings: Vec<&'static Encoding>,
}

impl CrawlOrchestrator {
    /// Creates an orchestrator
    ///
    /// # Arguments
    ///
    /// * `gate` - Permission check run before every fetch
    /// * `fetcher` - Fetches the page itself
    /// * `store` - Page metadata and content blobs
    /// * `publisher` - Summary and link fan-out
    /// * `fallback_encodings` - Tried in order when the declared charset is missing or wrong
    pub fn new(
        gate: Arc<PolitenessGate>,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<ContentStore>,
        publisher: Arc<PartitionPublisher>,
        fallback_encodings: Vec<&'static Encoding>,
    ) -> Self {
        Self {
            gate,
            fetcher,
            store,
            publisher,
            fallback_encodings,
        }
    }

    pub fn gate(&self) -> &PolitenessGate {
        &self.gate
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Crawls one URL end to end
    ///
    /// Skips (disallowed, bad status, undecodable) are `Ok`; fetch, storage and
    /// publish failures are `Err`.
    pub async fn crawl(&self, url: &str) -> Result<CrawlOutcome, CrawlError> {
        if !self.gate.authorize(url).await {
            return Ok(CrawlOutcome::Disallowed);
        }

        let response = self.fetcher.get(url).await?;
        if !response.is_success() {
            tracing::debug!("{} | Skipping, HTTP {}", url, response.status);
            return Ok(CrawlOutcome::BadStatus {
                status: response.status,
            });
        }

        let Some(decoded) = decode_body(
            &response.body,
            response.content_type.as_deref(),
            &self.fallback_encodings,
        ) else {
            tracing::debug!("{} | Skipping, no encoding decodes the body", url);
            return Ok(CrawlOutcome::Undecodable);
        };
        tracing::debug!("{} | Decoded as {}", url, decoded.encoding.name());

        let page = parse_html(&decoded.text);
        let base = Url::parse(&response.url)?;
        let links = normalize_links(&base, page.hrefs.iter().map(String::as_str));

        let now = Utc::now();
        let timestamp_ms = now.timestamp_millis();

        let stored = self
            .store
            .upsert(url, page.title.as_deref(), decoded.text.as_bytes(), now)
            .await?;

        self.publisher
            .publish_summary(url, &links, timestamp_ms)
            .await?;
        self.publisher
            .publish_discovered_links(&links, timestamp_ms)
            .await?;

        tracing::info!("{} | Crawled ({} links)", url, links.len());

        Ok(CrawlOutcome::Crawled {
            hash: stored.hash,
            title: page.title,
            links,
        })
    }
}
