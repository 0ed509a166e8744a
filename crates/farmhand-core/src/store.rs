//! Credential persistence.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::Result;
use crate::tokens::CredentialPair;

/// Durable storage for the session's credential pair.
///
/// Implementations must survive process restarts (except [`MemoryStore`],
/// which exists for tests and short-lived tools). `clear` removes everything
/// so a later `load` returns `None`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the persisted pair, if any.
    async fn load(&self) -> Result<Option<CredentialPair>>;

    /// Replace the persisted pair.
    async fn save(&self, pair: &CredentialPair) -> Result<()>;

    /// Remove the persisted pair.
    async fn clear(&self) -> Result<()>;
}

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pair: Mutex<Option<CredentialPair>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a pair.
    pub fn with_pair(pair: CredentialPair) -> Self {
        Self {
            pair: Mutex::new(Some(pair)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn load(&self) -> Result<Option<CredentialPair>> {
        Ok(self.pair.lock().await.clone())
    }

    async fn save(&self, pair: &CredentialPair) -> Result<()> {
        *self.pair.lock().await = Some(pair.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.pair.lock().await = None;
        Ok(())
    }
}
