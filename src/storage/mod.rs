//! Storage backend abstraction for recipe images.
//!
//! Only a local filesystem backend exists; stored files are served by
//! `actix-files` under the configured media URL.

pub mod local;

use async_trait::async_trait;

/// Storage operation errors.
#[derive(Debug)]
pub enum StorageError {
    /// File not found
    NotFound(String),
    /// Key would escape the storage root
    InvalidKey(String),
    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::NotFound(msg) => write!(f, "Not found: {}", msg),
            StorageError::InvalidKey(key) => write!(f, "Invalid key: {}", key),
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(e.to_string())
        } else {
            StorageError::Io(e)
        }
    }
}

/// Trait for storage backends.
///
/// Keys are relative paths such as `images/<uuid>.png`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a file under `key`, replacing any previous content.
    async fn put_object(&self, data: Vec<u8>, key: &str) -> Result<(), StorageError>;

    /// Remove the file stored under `key`.
    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;
}
