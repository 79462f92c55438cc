//! Local filesystem storage backend.

use super::{StorageBackend, StorageError};
use actix_web::web;
use async_trait::async_trait;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Local filesystem storage backend.
pub struct LocalStorage {
    /// Base path for file storage
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend.
    ///
    /// The `base_path` directory will be created if it doesn't exist.
    pub fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path)?;
        log::info!("LocalStorage initialized at {:?}", base_path);
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolves a key below the base path, rejecting absolute paths and `..`.
    fn get_file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if key.is_empty() || !is_plain {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }

        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn put_object(&self, data: Vec<u8>, key: &str) -> Result<(), StorageError> {
        let path = self.get_file_path(key)?;
        log::info!("LocalStorage: put_object: {:?}", path);

        // Use web::block for blocking file operations
        web::block(move || {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, data)
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        let path = self.get_file_path(key)?;
        log::info!("LocalStorage: delete_object: {:?}", path);

        web::block(move || fs::remove_file(&path))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf()).unwrap();

        assert!(storage.get_file_path("../etc/passwd").is_err());
        assert!(storage.get_file_path("/etc/passwd").is_err());
        assert!(storage.get_file_path("").is_err());
        assert_eq!(
            storage.get_file_path("images/a.png").unwrap(),
            dir.path().join("images").join("a.png")
        );
    }

    #[actix_rt::test]
    async fn test_put_object_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf()).unwrap();

        storage
            .put_object(b"\x89PNG".to_vec(), "images/test.png")
            .await
            .unwrap();

        assert!(!dir.path().join("images/other.png").exists());
        assert_eq!(
            fs::read(dir.path().join("images/test.png")).unwrap(),
            b"\x89PNG".to_vec()
        );
    }

    #[actix_rt::test]
    async fn test_delete_object() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf()).unwrap();

        storage.put_object(b"GIF89a".to_vec(), "images/a.gif").await.unwrap();
        storage.delete_object("images/a.gif").await.unwrap();
        assert!(!dir.path().join("images/a.gif").exists());

        assert!(matches!(
            storage.delete_object("images/a.gif").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
