//! Durable upload storage
//!
//! Filesystem byte-store for raw uploads. Names are namespaced by the
//! owning user id so repeated uploads of the same filename by different
//! users never collide. Writes are not transactional with the database;
//! the ingestion pipeline compensates by deleting written files when a
//! later step fails.

use crate::errors::{AppError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

#[derive(Clone)]
pub struct UploadStore {
    base_dir: PathBuf,
}

impl UploadStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Storage path for an upload, namespaced by the owning user
    fn path_for(&self, user_id: i64, filename: &str) -> PathBuf {
        self.base_dir.join(format!("{}_{}", user_id, filename))
    }

    /// Persist raw upload bytes, returning the path written
    pub async fn write(&self, user_id: i64, filename: &str, data: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir).await?;
        let path = self.path_for(user_id, filename);
        debug!(path = %path.display(), size = data.len(), "upload_store: write");
        fs::write(&path, data).await?;
        Ok(path)
    }

    /// Delete a previously written upload. A file that is already gone is
    /// benign; any other failure is surfaced.
    pub async fn delete(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "upload_store: delete");
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(tag: &str) -> UploadStore {
        let dir = std::env::temp_dir().join(format!("lectern-store-{}-{}", tag, std::process::id()));
        UploadStore::new(dir)
    }

    #[tokio::test]
    async fn test_write_then_delete() {
        let store = test_store("roundtrip");
        let path = store.write(1, "slides.pdf", b"%PDF-fake").await.unwrap();
        assert!(path.ends_with("1_slides.pdf"));
        assert_eq!(fs::read(&path).await.unwrap(), b"%PDF-fake");

        store.delete(&path).await.unwrap();
        assert!(fs::metadata(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_benign() {
        let store = test_store("missing");
        let path = store.path_for(1, "never-written.txt");
        store.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_user_namespacing_prevents_collisions() {
        let store = test_store("namespace");
        let a = store.write(1, "notes.txt", b"user one").await.unwrap();
        let b = store.write(2, "notes.txt", b"user two").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(fs::read(&a).await.unwrap(), b"user one");
        assert_eq!(fs::read(&b).await.unwrap(), b"user two");
    }
}
