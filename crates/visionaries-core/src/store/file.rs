use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{SessionStore, StoreError};
use crate::auth::SessionSnapshot;

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Session store writing pretty JSON to `<dir>/session.json`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(snapshot)?;
        tokio::fs::write(&path, contents).await?;
        debug!(path = %path.display(), "Session saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionSnapshot>, StoreError> {
        let path = self.path();
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        remove_if_exists(&self.path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthTokens;
    use chrono::{Duration, Utc};

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            user: None,
            tokens: Some(AuthTokens {
                access_token: "at".to_string(),
                refresh_token: "rt".to_string(),
                expires_at: Utc::now() + Duration::minutes(30),
            }),
            authenticated: false,
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = FileStore::new(dir.path().to_path_buf());
        assert!(store.load().await.expect("load succeeds").is_none());
        // Clearing with nothing saved is fine
        store.clear().await.expect("clear succeeds");
    }

    #[tokio::test]
    async fn test_save_creates_directories_and_clear_removes() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = FileStore::new(dir.path().join("nested").join("app"));

        store.save(&snapshot()).await.expect("save succeeds");
        assert!(store.path().exists());
        let loaded = store.load().await.expect("load succeeds");
        assert_eq!(loaded.and_then(|s| s.tokens).map(|t| t.access_token), Some("at".to_string()));

        store.clear().await.expect("clear succeeds");
        assert!(!store.path().exists());
        assert!(store.load().await.expect("load succeeds").is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = FileStore::new(dir.path().to_path_buf());
        std::fs::write(store.path(), "{not json").expect("write corrupt file");
        assert!(matches!(store.load().await, Err(StoreError::Serialization(_))));
    }
}
