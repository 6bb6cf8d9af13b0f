//! Durable session storage.
//!
//! The session manager persists a [`SessionSnapshot`] through the
//! `SessionStore` trait after every transition. Implementations:
//! - `KeyringStore`: OS secure storage (Keychain, kernel keyutils, Credential Manager)
//! - `FileStore`: a JSON file in the app data directory
//! - `MemoryStore`: a process-local slot for tests and throwaway runs

pub mod file;
pub mod keychain;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

use crate::auth::SessionSnapshot;
use crate::config::Config;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Secure storage error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A single mutable slot holding the persisted session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError>;

    /// `Ok(None)` when nothing has been saved (or it was cleared).
    async fn load(&self) -> Result<Option<SessionSnapshot>, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

/// Which store backs the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Keyring,
    File,
    Memory,
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keyring" => Ok(StoreKind::Keyring),
            "file" => Ok(StoreKind::File),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("Unknown store kind: {}", other)),
        }
    }
}

/// Build the store selected in the config.
pub fn store_from_config(config: &Config) -> anyhow::Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match config.store {
        StoreKind::Keyring => Arc::new(KeyringStore::new()),
        StoreKind::File => Arc::new(FileStore::new(config.data_dir()?)),
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::debug!(kind = ?config.store, "Session store configured");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_kind_parse() {
        assert_eq!("keyring".parse::<StoreKind>(), Ok(StoreKind::Keyring));
        assert_eq!("FILE".parse::<StoreKind>(), Ok(StoreKind::File));
        assert_eq!(" memory ".parse::<StoreKind>(), Ok(StoreKind::Memory));
        assert!("redis".parse::<StoreKind>().is_err());
    }

    #[test]
    fn test_store_from_config_memory() {
        let config = Config {
            store: StoreKind::Memory,
            ..Config::default()
        };
        assert!(store_from_config(&config).is_ok());
    }
}
