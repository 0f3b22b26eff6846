use std::path::{Path, PathBuf};

use super::{ClientError, ClientResult};
use crate::domain::Session;

/// The signed-in session cached between CLI runs as a JSON file
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/peakstreak/session.json`
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("peakstreak").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached session, if any
    pub fn load(&self) -> ClientResult<Option<Session>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| ClientError::Session(format!("{:?}: {}", self.path, e)))
    }

    pub fn save(&self, session: &Session) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| ClientError::Session(e.to_string()))?;
        std::fs::write(&self.path, json)?;

        tracing::debug!("Saved session to {:?}", self.path);
        Ok(())
    }

    /// Forget the cached session; a missing file is not an error
    pub fn clear(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use chrono::Utc;
    use uuid::Uuid;

    fn session() -> Session {
        Session {
            token: "token-123".to_string(),
            user: User {
                id: Uuid::new_v4(),
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                avatar_url: None,
                created_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.load().unwrap().is_none());

        let session = session();
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        std::fs::write(store.path(), "{").unwrap();

        assert!(matches!(store.load(), Err(ClientError::Session(_))));
    }
}
