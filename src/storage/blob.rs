//! Filesystem blob store
//!
//! Blobs live at `<root>/<first two hex chars>/<full hex hash>`. Writes go to a
//! temporary file first and are renamed into place, so a reader never sees a
//! partially written blob.

use crate::storage::traits::{BlobStore, ContentHash, StorageResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, hash: &ContentHash) -> PathBuf {
        let hex = hash.to_hex();
        self.root.join(&hex[..2]).join(hex)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, hash: &ContentHash, content: &[u8]) -> StorageResult<()> {
        let path = self.path_for(hash);
        if tokio::fs::try_exists(&path).await? {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!("Stored blob {} ({} bytes)", hash, content.len());
        Ok(())
    }

    async fn delete(&self, hash: &ContentHash) -> StorageResult<()> {
        match tokio::fs::remove_file(self.path_for(hash)).await {
            Ok(()) => {
                tracing::debug!("Deleted blob {}", hash);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn contains(&self, hash: &ContentHash) -> StorageResult<bool> {
        Ok(tokio::fs::try_exists(self.path_for(hash)).await?)
    }

    async fn get(&self, hash: &ContentHash) -> StorageResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(hash)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
