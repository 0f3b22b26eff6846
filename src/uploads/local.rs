use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{FileStorage, FileStorageError, FileStorageResult};

/// Files in one directory on local disk, served under `public_prefix`
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_prefix: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        let public_prefix = public_prefix.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            public_prefix,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    /// Create the storage directory if it does not exist
    pub async fn ensure_dir(&self) -> FileStorageResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn path_for(&self, file_name: &str) -> FileStorageResult<PathBuf> {
        let valid = !file_name.is_empty()
            && file_name != "."
            && file_name != ".."
            && !file_name.contains(['/', '\\']);
        if !valid {
            return Err(FileStorageError::InvalidPath(file_name.to_string()));
        }
        Ok(self.root.join(file_name))
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn save(&self, file_name: &str, data: &[u8]) -> FileStorageResult<String> {
        let path = self.path_for(file_name)?;
        self.ensure_dir().await?;
        tokio::fs::write(&path, data).await?;

        tracing::debug!("Stored {} bytes at {:?}", data.len(), path);
        Ok(format!("{}/{}", self.public_prefix, file_name))
    }

    async fn delete(&self, public_url: &str) -> FileStorageResult<()> {
        let file_name = public_url
            .strip_prefix(&self.public_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| FileStorageError::InvalidPath(public_url.to_string()))?;
        let path = self.path_for(file_name)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_and_delete() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("avatars"), "/uploads/avatars/");

        let url = storage.save("a.png", b"png-bytes").await.unwrap();
        assert_eq!(url, "/uploads/avatars/a.png");

        let on_disk = dir.path().join("avatars").join("a.png");
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"png-bytes");

        storage.delete(&url).await.unwrap();
        assert!(!on_disk.exists());

        // Already gone
        storage.delete(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "/uploads/avatars");

        assert!(matches!(
            storage.save("../evil.png", b"x").await,
            Err(FileStorageError::InvalidPath(_))
        ));
        assert!(matches!(
            storage.delete("/uploads/avatars/../../etc/passwd").await,
            Err(FileStorageError::InvalidPath(_))
        ));
        assert!(matches!(
            storage.delete("/elsewhere/a.png").await,
            Err(FileStorageError::InvalidPath(_))
        ));
    }
}
