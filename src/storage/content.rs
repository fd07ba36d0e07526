//! Content-addressed page store with write-time garbage collection

use crate::politeness::LockRegistry;
use crate::storage::traits::{BlobStore, ContentHash, MetadataStore, PageRecord, StorageResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// What an upsert changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Hash of the content just stored
    pub hash: ContentHash,

    /// Hash the record held before, if the URL had been crawled already
    pub previous: Option<ContentHash>,

    /// Whether the previous blob was deleted because nothing references it anymore
    pub reclaimed: bool,
}

/// Page metadata plus deduplicated content blobs
///
/// Blob writes, record swaps and orphan checks for one hash are serialized through a
/// per-hash lock, so a blob is never deleted while another upsert in this process
/// starts to reference it. A record never points at a blob that was not written.
pub struct ContentStore {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    hash_locks: LockRegistry,
}

impl ContentStore {
    pub fn new(metadata: Arc<dyn MetadataStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            metadata,
            blobs,
            hash_locks: LockRegistry::new(),
        }
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Records a crawl of `url` and garbage-collects the content it replaced
    ///
    /// Metadata and blob write errors propagate. A failed blob write leaves the
    /// previous record in place. A failed deletion of an orphaned blob is only
    /// logged; the record is already updated at that point.
    pub async fn upsert(
        &self,
        url: &str,
        title: Option<&str>,
        content: &[u8],
        crawled_at: DateTime<Utc>,
    ) -> StorageResult<UpsertOutcome> {
        let hash = ContentHash::of(content);
        let record = PageRecord {
            url: url.to_string(),
            hash,
            title: title.map(str::to_string),
            crawled_at,
        };

        // Blob first, record second, both under the new hash's lock: a failure or
        // cancellation in between leaves at most an unreferenced blob.
        let previous = {
            let lease = self.hash_locks.acquire(&hash.to_hex());
            let _guard = lease.lock().await;
            self.blobs.put(&hash, content).await?;
            self.metadata.upsert_returning_previous(&record).await?
        };
        tracing::debug!("{} | Stored record {:?} (previous {:?})", url, hash, previous);

        let reclaimed = match previous {
            Some(old) if old != hash => self.collect_if_orphaned(url, &old).await?,
            _ => false,
        };

        Ok(UpsertOutcome {
            hash,
            previous,
            reclaimed,
        })
    }

    async fn collect_if_orphaned(&self, url: &str, hash: &ContentHash) -> StorageResult<bool> {
        let lease = self.hash_locks.acquire(&hash.to_hex());
        let _guard = lease.lock().await;

        let references = self.metadata.count_referencing(hash).await?;
        if references > 0 {
            tracing::debug!(
                "{} | Keeping blob {:?}, still referenced by {} page(s)",
                url,
                hash,
                references
            );
            return Ok(false);
        }

        match self.blobs.delete(hash).await {
            Ok(()) => {
                tracing::debug!("{} | Reclaimed orphaned blob {:?}", url, hash);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("{} | Failed to delete orphaned blob {}: {}", url, hash, e);
                Ok(false)
            }
        }
    }
}
