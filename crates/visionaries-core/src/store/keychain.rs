use async_trait::async_trait;
use keyring::Entry;

use super::{SessionStore, StoreError};
use crate::auth::SessionSnapshot;

const SERVICE_NAME: &str = "visionaries-school";

/// Entry holding the serialized session.
const SESSION_ENTRY: &str = "auth-storage";

/// Session store backed by the OS keychain.
pub struct KeyringStore {
    service: String,
    entry: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_names(SERVICE_NAME, SESSION_ENTRY)
    }

    pub fn with_names(service: impl Into<String>, entry: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entry: entry.into(),
        }
    }

    /// Keyring calls block (D-Bus, Security framework), so they run on the
    /// blocking pool.
    async fn with_entry<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(Entry) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let service = self.service.clone();
        let entry = self.entry.clone();
        tokio::task::spawn_blocking(move || op(Entry::new(&service, &entry)?)).await?
    }
}

#[async_trait]
impl SessionStore for KeyringStore {
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        let payload = serde_json::to_string(snapshot)?;
        self.with_entry(move |entry| Ok(entry.set_password(&payload)?))
            .await
    }

    async fn load(&self) -> Result<Option<SessionSnapshot>, StoreError> {
        let payload = self
            .with_entry(|entry| match entry.get_password() {
                Ok(payload) => Ok(Some(payload)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(e.into()),
            })
            .await?;
        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.with_entry(|entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        })
        .await
    }
}
