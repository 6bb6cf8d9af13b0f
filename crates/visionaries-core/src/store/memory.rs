use std::sync::Mutex;

use async_trait::async_trait;

use super::{SessionStore, StoreError};
use crate::auth::SessionSnapshot;

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<SessionSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store, as if a previous run had saved `snapshot`.
    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            slot: Mutex::new(Some(snapshot)),
        }
    }

    /// Current slot contents without going through the async trait.
    pub fn peek(&self) -> Option<SessionSnapshot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionSnapshot>, StoreError> {
        Ok(self.peek())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
