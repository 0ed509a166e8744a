//! The shared session object.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::Result;
use crate::error::AuthError;
use crate::store::{CredentialStore, MemoryStore};
use crate::tokens::{AccessToken, CredentialPair, RefreshToken};

/// The live credential state for one user session.
///
/// Every component that reads or writes credentials takes a `Session` as an
/// explicit dependency. Sessions are cheap to clone (they use internal `Arc`)
/// and all clones see the same state.
///
/// The in-memory copy is authoritative for reads; every write goes through to
/// the backing [`CredentialStore`] while holding the write lock, so there is
/// one writer at a time.
///
/// # Example
///
/// ```
/// use farmhand_core::{AccessToken, CredentialPair, RefreshToken, Session};
///
/// # async fn example() -> Result<(), farmhand_core::Error> {
/// let session = Session::in_memory();
/// session
///     .set(CredentialPair::new(
///         AccessToken::new("access"),
///         Some(RefreshToken::new("refresh")),
///     ))
///     .await?;
/// assert!(session.is_authenticated().await);
///
/// session.clear().await?;
/// assert!(session.access_token().await.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Arc<dyn CredentialStore>,
    tokens: RwLock<Option<CredentialPair>>,
}

impl Session {
    /// Create an empty session backed by `store`.
    ///
    /// Nothing is read from the store; use [`Session::restore`] to pick up a
    /// previously persisted pair.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store,
                tokens: RwLock::new(None),
            }),
        }
    }

    /// Create a session from whatever `store` currently holds.
    pub async fn restore(store: Arc<dyn CredentialStore>) -> Result<Self> {
        let tokens = store.load().await?;
        debug!(restored = tokens.is_some(), "Restoring session");
        Ok(Self {
            inner: Arc::new(SessionInner {
                store,
                tokens: RwLock::new(tokens),
            }),
        })
    }

    /// Create a session that only lives in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The current access token, if the session holds one.
    pub async fn access_token(&self) -> Option<AccessToken> {
        self.inner
            .tokens
            .read()
            .await
            .as_ref()
            .map(|pair| pair.access.clone())
    }

    /// The current refresh token, if the session holds one.
    pub async fn refresh_token(&self) -> Option<RefreshToken> {
        self.inner
            .tokens
            .read()
            .await
            .as_ref()
            .and_then(|pair| pair.refresh.clone())
    }

    /// A snapshot of the whole pair.
    pub async fn credentials(&self) -> Option<CredentialPair> {
        self.inner.tokens.read().await.clone()
    }

    /// Whether an access token is present.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.tokens.read().await.is_some()
    }

    /// Replace the credential pair and persist it.
    pub async fn set(&self, pair: CredentialPair) -> Result<()> {
        let mut tokens = self.inner.tokens.write().await;
        self.inner.store.save(&pair).await?;
        *tokens = Some(pair);
        debug!("Session credentials set");
        Ok(())
    }

    /// Swap in a refreshed access token.
    ///
    /// The stored refresh token is kept unless `rotated` carries a new one.
    /// Fails with [`AuthError::SessionExpired`] if the session was cleared
    /// while the refresh was in flight; a cleared session is never revived
    /// by a late refresh.
    ///
    /// The in-memory pair is updated before persisting, so a storage error
    /// still leaves the new token usable for this process.
    pub async fn update_access(
        &self,
        access: AccessToken,
        rotated: Option<RefreshToken>,
    ) -> Result<()> {
        let mut tokens = self.inner.tokens.write().await;
        let pair = tokens.as_mut().ok_or(AuthError::SessionExpired)?;

        pair.access = access;
        if let Some(refresh) = rotated {
            pair.refresh = Some(refresh);
        }

        let snapshot = pair.clone();
        self.inner.store.save(&snapshot).await
    }

    /// Drop the credentials from memory and from the store.
    ///
    /// Memory is cleared first so no request can pick up the old token even
    /// if the store fails.
    pub async fn clear(&self) -> Result<()> {
        let mut tokens = self.inner.tokens.write().await;
        *tokens = None;
        debug!("Session credentials cleared");
        self.inner.store.clear().await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(access: &str, refresh: Option<&str>) -> CredentialPair {
        CredentialPair::new(AccessToken::new(access), refresh.map(RefreshToken::new))
    }

    #[tokio::test]
    async fn set_persists_to_store() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());

        session.set(pair("a1", Some("r1"))).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(pair("a1", Some("r1"))));
        assert_eq!(session.access_token().await, Some(AccessToken::new("a1")));
    }

    #[tokio::test]
    async fn restore_reads_store() {
        let store = Arc::new(MemoryStore::with_pair(pair("a1", Some("r1"))));
        let session = Session::restore(store).await.unwrap();
        assert_eq!(session.refresh_token().await, Some(RefreshToken::new("r1")));
    }

    #[tokio::test]
    async fn update_access_keeps_refresh_token_without_rotation() {
        let session = Session::in_memory();
        session.set(pair("a1", Some("r1"))).await.unwrap();

        session
            .update_access(AccessToken::new("a2"), None)
            .await
            .unwrap();

        assert_eq!(session.credentials().await, Some(pair("a2", Some("r1"))));
    }

    #[tokio::test]
    async fn update_access_persists_rotated_refresh_token() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());
        session.set(pair("a1", Some("r1"))).await.unwrap();

        session
            .update_access(AccessToken::new("a2"), Some(RefreshToken::new("r2")))
            .await
            .unwrap();

        assert_eq!(store.load().await.unwrap(), Some(pair("a2", Some("r2"))));
    }

    #[tokio::test]
    async fn update_access_does_not_revive_cleared_session() {
        let session = Session::in_memory();
        session.set(pair("a1", Some("r1"))).await.unwrap();
        session.clear().await.unwrap();

        let result = session.update_access(AccessToken::new("a2"), None).await;

        assert!(result.unwrap_err().is_session_expired());
        assert!(session.access_token().await.is_none());
    }

    #[tokio::test]
    async fn clear_removes_memory_and_store() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());
        session.set(pair("a1", Some("r1"))).await.unwrap();

        session.clear().await.unwrap();

        assert!(!session.is_authenticated().await);
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let session = Session::in_memory();
        let other = session.clone();
        session.set(pair("a1", None)).await.unwrap();
        assert_eq!(other.access_token().await, Some(AccessToken::new("a1")));
        assert!(other.refresh_token().await.is_none());
    }

    #[test]
    fn debug_redacts_tokens() {
        let debug = format!("{:?}", Session::in_memory());
        assert!(debug.contains("[REDACTED]"));
    }
}
