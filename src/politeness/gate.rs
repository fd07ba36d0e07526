//! Crawl permission checks
//!
//! [`PolitenessGate::authorize`] answers "may this URL be fetched?" by running a
//! cheap Content-Type check first and the robots.txt check second. It fails closed:
//! any network or parse failure turns into `false`.

use crate::crawler::{decode_body, Fetcher};
use crate::politeness::cache::RobotsCache;
use crate::politeness::locks::DomainLockRegistry;
use crate::politeness::robots::ParsedRobots;
use crate::politeness::PolitenessError;
use crate::url::{is_crawlable_scheme, robots_txt_url};
use encoding_rs::UTF_8;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Why a URL was or was not cleared for crawling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    UnsupportedScheme,
    NotHtml { content_type: Option<String> },
    DisallowedByRobots,
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Decides whether a URL may be fetched
pub struct PolitenessGate {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<dyn RobotsCache>,
    locks: DomainLockRegistry,
    product_token: String,
    robots_ttl: Duration,
}

impl PolitenessGate {
    /// Creates a gate
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Issues the HEAD and robots.txt requests
    /// * `cache` - Robots.txt cache keyed by robots.txt URL
    /// * `product_token` - Crawler name matched against robots.txt `User-agent` groups
    /// * `robots_ttl` - How long a fetched robots.txt stays cached
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<dyn RobotsCache>,
        product_token: impl Into<String>,
        robots_ttl: Duration,
    ) -> Self {
        Self {
            fetcher,
            cache,
            locks: DomainLockRegistry::new(),
            product_token: product_token.into(),
            robots_ttl,
        }
    }

    /// The per-domain lock registry (exposed for inspection)
    pub fn locks(&self) -> &DomainLockRegistry {
        &self.locks
    }

    /// Returns true if `url` may be crawled; never fails
    pub async fn authorize(&self, url: &str) -> bool {
        match self.evaluate(url).await {
            Ok(Verdict::Allowed) => true,
            Ok(Verdict::UnsupportedScheme) => {
                tracing::debug!("{} | Cannot crawl due to scheme", url);
                false
            }
            Ok(Verdict::NotHtml { content_type }) => {
                tracing::debug!(
                    "{} | Cannot crawl due to content type {:?}",
                    url,
                    content_type
                );
                false
            }
            Ok(Verdict::DisallowedByRobots) => {
                tracing::debug!("{} | Cannot crawl due to robots.txt", url);
                false
            }
            Err(e) => {
                tracing::error!("{} | {}", url, e);
                false
            }
        }
    }

    /// Runs the full permission check and reports the reason
    pub async fn evaluate(&self, url: &str) -> Result<Verdict, PolitenessError> {
        let parsed = Url::parse(url)?;
        if !is_crawlable_scheme(&parsed) {
            return Ok(Verdict::UnsupportedScheme);
        }

        let head = self.fetcher.head(url).await?;
        if !head.is_html() {
            return Ok(Verdict::NotHtml {
                content_type: head.content_type,
            });
        }

        if self.robots_allow(&parsed).await? {
            Ok(Verdict::Allowed)
        } else {
            Ok(Verdict::DisallowedByRobots)
        }
    }

    /// Checks robots.txt for the URL's host, fetching and caching it on a miss
    ///
    /// Only the cache lookup and the fetch run under the domain lock. Caching the
    /// fresh body and evaluating the rules happen after the lock is returned, so two
    /// first requests for one domain may both fetch robots.txt; the later cache write wins.
    async fn robots_allow(&self, url: &Url) -> Result<bool, PolitenessError> {
        let robots_url =
            robots_txt_url(url).ok_or_else(|| PolitenessError::MissingHost(url.to_string()))?;

        let lease = self.locks.acquire(&robots_url);
        let (content, fetched) = {
            let _guard = lease.lock().await;
            match self.cache.get(&robots_url).await {
                Some(content) => {
                    tracing::debug!("{} | Found robots.txt in cache for {}", url, robots_url);
                    (content, false)
                }
                None => {
                    tracing::debug!("{} | Fetching {}", url, robots_url);
                    (self.fetch_robots(&robots_url).await?, true)
                }
            }
        };
        lease.release();

        if fetched {
            self.cache
                .set(&robots_url, content.clone(), self.robots_ttl)
                .await;
        }

        Ok(ParsedRobots::from_content(content).is_allowed(url.as_str(), &self.product_token))
    }

    /// Fetches robots.txt text
    ///
    /// 4xx means "no robots.txt" and yields an empty (permissive) body, as does a body
    /// that is not valid text. 5xx is an error, so the crawl is refused and nothing
    /// is cached.
    async fn fetch_robots(&self, robots_url: &str) -> Result<String, PolitenessError> {
        let response = self.fetcher.get(robots_url).await?;

        if response.status >= 500 {
            return Err(PolitenessError::RobotsUnavailable {
                url: robots_url.to_string(),
                status: response.status,
            });
        }

        if !response.is_success() {
            return Ok(String::new());
        }

        let text = decode_body(&response.body, response.content_type.as_deref(), &[UTF_8])
            .map(|decoded| decoded.text)
            .unwrap_or_else(|| {
                tracing::debug!("{} | Undecodable robots.txt, treating as empty", robots_url);
                String::new()
            });

        Ok(text)
    }
}
