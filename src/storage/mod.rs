//! Storage module for crawled page content
//!
//! This module handles persistence for the crawler:
//! - Page metadata (one record per URL) in SQLite
//! - Content blobs addressed by their SHA-512 hash on the filesystem
//! - Write-time garbage collection of blobs no page references anymore

mod blob;
mod content;
mod schema;
mod sqlite;
mod traits;

pub use blob::FsBlobStore;
pub use content::{ContentStore, UpsertOutcome};
pub use sqlite::SqliteMetadataStore;
pub use traits::{
    BlobStore, ContentHash, MetadataStore, PageRecord, StorageError, StorageResult,
};

use crate::config::StorageConfig;
use std::path::Path;
use std::sync::Arc;

/// Opens the configured metadata database and blob directory
///
/// # Arguments
///
/// * `config` - Storage section of the configuration
///
/// # Returns
///
/// * `Ok(ContentStore)` - Successfully opened storage
/// * `Err(StorageError)` - Failed to open the database or create the blob directory
pub fn open_content_store(config: &StorageConfig) -> StorageResult<ContentStore> {
    std::fs::create_dir_all(&config.blob_dir)?;
    let metadata = SqliteMetadataStore::new(Path::new(&config.database_path))?;
    let blobs = FsBlobStore::new(&config.blob_dir);

    tracing::info!(
        "Opened storage (database: {}, blobs: {})",
        config.database_path, config.blob_dir
    );

    Ok(ContentStore::new(Arc::new(metadata), Arc::new(blobs)))
}
