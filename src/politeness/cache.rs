//! Robots.txt caching
//!
//! The politeness gate stores the raw robots.txt text per robots.txt URL, with a
//! fixed time-to-live. [`RobotsCache`] is the seam for an external expiring store;
//! [`MemoryRobotsCache`] is the in-process implementation.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Expiring key-value store for robots.txt bodies
#[async_trait]
pub trait RobotsCache: Send + Sync {
    /// Returns the cached value, or `None` on a miss or an expired entry
    async fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key` for `ttl`, replacing any previous entry
    async fn set(&self, key: &str, value: String, ttl: Duration);
}

/// Cached robots.txt data for a domain
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The raw robots.txt text
    pub content: String,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,

    /// When the entry stops being served
    pub expires_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Creates a new entry fetched now and valid for `ttl`
    pub fn new(content: String, ttl: Duration) -> Self {
        let fetched_at = Utc::now();
        let expires_at = ChronoDuration::from_std(ttl)
            .ok()
            .and_then(|ttl| fetched_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            content,
            fetched_at,
            expires_at,
        }
    }

    /// Checks if the entry has outlived its time-to-live
    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }

    fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns the age of the cached robots.txt
    pub fn age(&self) -> ChronoDuration {
        Utc::now() - self.fetched_at
    }
}

/// In-process robots cache with per-entry expiration
///
/// Expired entries are dropped lazily on read and swept on every write, so the map
/// holds at most the domains seen within one TTL window.
#[derive(Debug, Default)]
pub struct MemoryRobotsCache {
    entries: Mutex<HashMap<String, CachedRobots>>,
}

impl MemoryRobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently stored, including any not yet swept
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Removes every expired entry and returns how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, cached| !cached.is_stale_at(now));
        before - entries.len()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedRobots>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RobotsCache for MemoryRobotsCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries();
        let expired = match entries.get(key) {
            Some(cached) if !cached.is_stale() => return Some(cached.content.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let purged = self.purge_expired();
        if purged > 0 {
            tracing::debug!("Purged {} expired robots.txt entries", purged);
        }
        self.entries()
            .insert(key.to_string(), CachedRobots::new(value, ttl));
    }
}
