//! Reference-counted keyed locks
//!
//! A [`LockRegistry`] hands out one async mutex per key and forgets the key as soon
//! as the last borrower returns it, so memory is bounded by the number of keys with
//! in-flight work rather than by every key ever seen.
//!
//! The politeness gate keys the registry by robots.txt URL ([`DomainLockRegistry`]);
//! the content store keys a second registry by content hash.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

/// Registry of per-domain locks used by the politeness gate
pub type DomainLockRegistry = LockRegistry;

#[derive(Debug)]
struct Entry {
    lock: Arc<AsyncMutex<()>>,
    borrowers: usize,
}

/// Keyed mutexes with create-on-first-borrow / destroy-on-zero semantics
///
/// All map and counter mutations happen under a registry-wide meta-lock, which is a
/// synchronous mutex that is never held across an `.await`. The per-key mutex only
/// guards whatever critical section the caller wraps around [`KeyLease::lock`].
#[derive(Debug, Default)]
pub struct LockRegistry {
    entries: Mutex<HashMap<String, Entry>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows the lock for `key`, creating it on first use
    ///
    /// The borrower count is incremented immediately. The returned lease must be
    /// locked by the caller before entering the critical section; dropping the lease
    /// (or calling [`KeyLease::release`]) returns it to the registry.
    pub fn acquire(&self, key: &str) -> KeyLease<'_> {
        let mut entries = self.entries();
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            lock: Arc::new(AsyncMutex::new(())),
            borrowers: 0,
        });
        entry.borrowers += 1;

        KeyLease {
            registry: self,
            key: key.to_string(),
            lock: Arc::clone(&entry.lock),
        }
    }

    /// Number of keys that currently have at least one borrower
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Current borrower count for `key` (zero if the key is not registered)
    pub fn borrowers(&self, key: &str) -> usize {
        self.entries().get(key).map_or(0, |entry| entry.borrowers)
    }

    fn release(&self, key: &str) {
        let mut entries = self.entries();
        if let Some(entry) = entries.get_mut(key) {
            entry.borrowers = entry.borrowers.saturating_sub(1);
            if entry.borrowers == 0 {
                entries.remove(key);
            }
        }
    }

    // Every critical section leaves the map consistent, so a poisoned guard is still usable.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A borrowed per-key lock; returned to the registry on drop
#[derive(Debug)]
pub struct KeyLease<'a> {
    registry: &'a LockRegistry,
    key: String,
    lock: Arc<AsyncMutex<()>>,
}

impl KeyLease<'_> {
    /// Waits for exclusive access to the key's critical section
    pub async fn lock(&self) -> AsyncMutexGuard<'_, ()> {
        self.lock.lock().await
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the lease to the registry
    pub fn release(self) {}
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.key);
    }
}
