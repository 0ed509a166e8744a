//! Single-flight access token refresh.

use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use farmhand_core::error::{AuthError, Error};
use farmhand_core::{AccessToken, RefreshToken, Result, Session};

use crate::client::HttpClient;
use crate::endpoints::{RefreshRequest, RefreshResponse, TOKEN_REFRESH};
use crate::request::ApiRequest;
use crate::transport::SessionEvent;

/// Mints new access tokens from the session's refresh token.
///
/// Refreshes are serialized behind one lock. A caller that waited while
/// another refresh completed gets that refresh's token instead of issuing its
/// own call, so N requests expiring together cost one refresh round-trip.
///
/// The coordinator never clears the session; deciding to end it on failure
/// belongs to [`AuthTransport`](crate::AuthTransport).
pub struct RefreshCoordinator {
    client: HttpClient,
    session: Session,
    events: broadcast::Sender<SessionEvent>,
    /// Held for the whole refresh. Remembers the last refresh token whose
    /// refresh failed on behalf of a request.
    gate: Mutex<Option<RefreshToken>>,
}

impl RefreshCoordinator {
    pub fn new(
        client: HttpClient,
        session: Session,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            client,
            session,
            events,
            gate: Mutex::new(None),
        }
    }

    /// Obtain a fresh access token after a request was refused with `stale`.
    ///
    /// If the session already holds a different token by the time the lock
    /// is acquired, that token is returned without a network call. A failed
    /// refresh is remembered, so requests queued behind it fail without
    /// repeating the call while the session is being ended.
    ///
    /// # Errors
    ///
    /// - [`AuthError::RefreshTokenMissing`] when no refresh token is stored
    ///   (no network call is made)
    /// - [`AuthError::RefreshRejected`] when the refresh call fails or the
    ///   token was already refused by an earlier request's refresh
    /// - [`Error::Cancelled`] when `cancel` fires first
    #[instrument(skip_all)]
    pub async fn refresh(
        &self,
        stale: Option<&AccessToken>,
        cancel: &CancellationToken,
    ) -> Result<AccessToken> {
        self.run(stale, cancel, Trigger::FailedRequest).await
    }

    /// Renew the current access token on demand.
    ///
    /// Always calls the refresh endpoint unless a concurrent refresh has
    /// already replaced the token. A failure is reported but not remembered,
    /// so it never short-circuits a later request's refresh.
    #[instrument(skip_all)]
    pub async fn refresh_current(&self, cancel: &CancellationToken) -> Result<AccessToken> {
        let current = self.session.access_token().await;
        self.run(current.as_ref(), cancel, Trigger::Explicit).await
    }

    async fn run(
        &self,
        stale: Option<&AccessToken>,
        cancel: &CancellationToken,
        trigger: Trigger,
    ) -> Result<AccessToken> {
        let mut rejected = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            guard = self.gate.lock() => guard,
        };

        let current = self.session.credentials().await;

        if let Some(pair) = &current
            && stale != Some(&pair.access)
        {
            debug!("Access token already replaced by a concurrent refresh");
            return Ok(pair.access.clone());
        }

        let refresh_token = current
            .and_then(|pair| pair.refresh)
            .ok_or(AuthError::RefreshTokenMissing)?;

        if trigger == Trigger::FailedRequest && rejected.as_ref() == Some(&refresh_token) {
            debug!("Refresh token was already rejected");
            return Err(AuthError::RefreshRejected {
                reason: "refresh token previously rejected".to_string(),
            }
            .into());
        }

        info!("Refreshing access token");

        let response = match self.request_refresh(&refresh_token, cancel).await {
            Ok(response) => response,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(err) => {
                warn!(error = %err, "Refresh call failed");
                if trigger == Trigger::FailedRequest {
                    *rejected = Some(refresh_token);
                }
                return Err(AuthError::RefreshRejected {
                    reason: err.to_string(),
                }
                .into());
            }
        };

        let access = AccessToken::new(response.access);
        let rotated = response.refresh.map(RefreshToken::new);
        if rotated.is_some() {
            debug!("Backend rotated the refresh token");
        }

        match self.session.update_access(access.clone(), rotated).await {
            Ok(()) => {}
            Err(err @ Error::Auth(_)) => return Err(err),
            Err(err) => {
                warn!(error = %err, "Failed to persist refreshed token, continuing with it");
            }
        }

        let _ = self.events.send(SessionEvent::Refreshed);
        debug!("Access token refreshed");
        Ok(access)
    }

    async fn request_refresh(
        &self,
        refresh_token: &RefreshToken,
        cancel: &CancellationToken,
    ) -> Result<RefreshResponse> {
        let request = ApiRequest::post(TOKEN_REFRESH).json(&RefreshRequest {
            refresh: refresh_token.as_str(),
        })?;

        self.client
            .send_unauthenticated(&request, cancel)
            .await?
            .into_result()?
            .json()
    }
}

/// What asked for the refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// A request got a 401; a failure ends the session.
    FailedRequest,
    /// The caller asked for a refresh; a failure leaves the session alone.
    Explicit,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("base_url", self.client.base_url())
            .finish()
    }
}
