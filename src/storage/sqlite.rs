//! SQLite metadata store
//!
//! This module provides a SQLite-based implementation of the MetadataStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    ContentHash, MetadataStore, PageRecord, StorageError, StorageResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// SQLite metadata backend
pub struct SqliteMetadataStore {
    conn: Mutex<Connection>,
}

impl SqliteMetadataStore {
    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteMetadataStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn decode_hash(url: &str, bytes: &[u8]) -> StorageResult<ContentHash> {
    ContentHash::from_slice(bytes).ok_or_else(|| {
        StorageError::CorruptRecord(format!(
            "{}: hash has {} bytes, expected {}",
            url,
            bytes.len(),
            ContentHash::LEN
        ))
    })
}

fn decode_timestamp(url: &str, raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::CorruptRecord(format!("{}: bad timestamp '{}': {}", url, raw, e)))
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn upsert_returning_previous(
        &self,
        record: &PageRecord,
    ) -> StorageResult<Option<ContentHash>> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous: Option<Vec<u8>> = tx
            .query_row(
                "SELECT hash FROM pages WHERE url = ?1",
                params![record.url],
                |row| row.get(0),
            )
            .optional()?;

        tx.execute(
            "INSERT INTO pages (url, hash, title, crawled_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(url) DO UPDATE SET
                hash = excluded.hash,
                title = excluded.title,
                crawled_at = excluded.crawled_at",
            params![
                record.url,
                record.hash.as_bytes(),
                record.title,
                record.crawled_at.to_rfc3339(),
            ],
        )?;

        tx.commit()?;

        previous
            .map(|bytes| decode_hash(&record.url, &bytes))
            .transpose()
    }

    async fn count_referencing(&self, hash: &ContentHash) -> StorageResult<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM pages WHERE hash = ?1",
            params![hash.as_bytes()],
            |row| row.get(0),
        )?;
        u64::try_from(count).map_err(|_| StorageError::Database(format!("negative count {}", count)))
    }

    async fn get_page(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let row: Option<(Vec<u8>, Option<String>, String)> = self
            .conn()
            .query_row(
                "SELECT hash, title, crawled_at FROM pages WHERE url = ?1",
                params![url],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(hash, title, crawled_at)| {
            Ok(PageRecord {
                url: url.to_string(),
                hash: decode_hash(url, &hash)?,
                title,
                crawled_at: decode_timestamp(url, &crawled_at)?,
            })
        })
        .transpose()
    }
}
