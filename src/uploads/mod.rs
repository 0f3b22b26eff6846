//! Uploaded file storage
//!
//! Avatars are written through [`FileStorage`] and addressed afterwards by
//! their public URL (the path the API serves them under).

mod local;

pub use local::LocalStorage;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A name or URL that would escape the storage directory
    #[error("Invalid file path: {0}")]
    InvalidPath(String),
}

pub type FileStorageResult<T> = Result<T, FileStorageError>;

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `data` as `file_name` and return its public URL
    async fn save(&self, file_name: &str, data: &[u8]) -> FileStorageResult<String>;

    /// Remove the file behind a public URL; missing files are not an error
    async fn delete(&self, public_url: &str) -> FileStorageResult<()>;
}
