//! Storage traits and error types
//!
//! This module defines the trait interfaces for the page metadata store and the
//! content blob store, plus the shared record types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha512};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// SHA-512 digest of a page's encoded content; the key of a content blob
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; ContentHash::LEN]);

impl ContentHash {
    pub const LEN: usize = 64;

    /// Hashes raw content bytes
    pub fn of(content: &[u8]) -> Self {
        let digest = Sha512::digest(content);
        let mut bytes = [0u8; Self::LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Rebuilds a hash from stored bytes; `None` if the length is wrong
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; Self::LEN]>::try_from(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}..)", &self.to_hex()[..16])
    }
}

/// Metadata of one crawled URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub url: String,
    pub hash: ContentHash,
    pub title: Option<String>,
    pub crawled_at: DateTime<Utc>,
}

/// Page metadata collection, keyed by URL
///
/// The store is the sole source of truth for which content hashes are referenced.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Inserts or replaces the record for `record.url` and returns the hash it held
    /// before, as one atomic operation
    async fn upsert_returning_previous(
        &self,
        record: &PageRecord,
    ) -> StorageResult<Option<ContentHash>>;

    /// Counts records whose hash equals `hash`
    async fn count_referencing(&self, hash: &ContentHash) -> StorageResult<u64>;

    /// Looks up the record for a URL
    async fn get_page(&self, url: &str) -> StorageResult<Option<PageRecord>>;
}

/// Content-addressed blob storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `content` under `hash`; storing an existing hash is a no-op
    async fn put(&self, hash: &ContentHash, content: &[u8]) -> StorageResult<()>;

    /// Deletes the blob; deleting a missing blob is not an error
    async fn delete(&self, hash: &ContentHash) -> StorageResult<()>;

    async fn contains(&self, hash: &ContentHash) -> StorageResult<bool>;

    async fn get(&self, hash: &ContentHash) -> StorageResult<Option<Vec<u8>>>;
}
