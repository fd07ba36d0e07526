//! Politeness module
//!
//! This module decides whether a URL may be fetched. It combines:
//! - A Content-Type pre-filter (HEAD request)
//! - Robots.txt rules for the crawler's product token
//! - A time-bounded robots.txt cache
//! - Reference-counted per-domain locks bounding concurrent robots.txt fetches

mod cache;
mod gate;
mod locks;
mod robots;

pub use cache::{CachedRobots, MemoryRobotsCache, RobotsCache};
pub use gate::{PolitenessGate, Verdict};
pub use locks::{DomainLockRegistry, KeyLease, LockRegistry};
pub use robots::ParsedRobots;

use crate::crawler::FetchError;
use thiserror::Error;

/// Failures while checking crawl permission; never surfaced by `authorize`
#[derive(Debug, Error)]
pub enum PolitenessError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("robots.txt unavailable at {url} (HTTP {status})")]
    RobotsUnavailable { url: String, status: u16 },
}
