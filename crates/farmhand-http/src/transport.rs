//! Authenticated transport.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use farmhand_core::error::{AuthError, Error};
use farmhand_core::{AccessToken, Result, Session};

use crate::client::{ApiResponse, HttpClient};
use crate::refresh::RefreshCoordinator;
use crate::request::{ApiRequest, RequestAttempt};

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 16;

/// Session state changes observable by the hosting application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A login stored a new credential pair.
    LoggedIn,
    /// An access token was refreshed.
    Refreshed,
    /// A refresh failed and the session was cleared. The host should send
    /// the user back to login.
    Expired,
    /// The user logged out.
    LoggedOut,
}

/// Sends requests with the session's bearer token and recovers from expiry.
///
/// For every request the current access token is attached (if any). A 401 on
/// the first attempt triggers one refresh through the [`RefreshCoordinator`]
/// followed by exactly one retry with the new token; whatever the retry
/// returns is final. If the refresh fails the session is cleared,
/// [`SessionEvent::Expired`] is broadcast and the request fails with
/// [`AuthError::SessionExpired`].
///
/// Cloning is cheap. Each clone carries its own cancellation token (see
/// [`AuthTransport::with_cancellation`]) and shares everything else.
#[derive(Clone)]
pub struct AuthTransport {
    inner: Arc<TransportInner>,
    cancel: CancellationToken,
}

struct TransportInner {
    client: HttpClient,
    session: Session,
    refresher: RefreshCoordinator,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthTransport {
    pub fn new(client: HttpClient, session: Session) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let refresher = RefreshCoordinator::new(client.clone(), session.clone(), events.clone());

        Self {
            inner: Arc::new(TransportInner {
                client,
                session,
                refresher,
                events,
            }),
            cancel: CancellationToken::new(),
        }
    }

    /// A handle whose requests, and any refresh they trigger, stop when
    /// `cancel` fires.
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel,
        }
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn client(&self) -> &HttpClient {
        &self.inner.client
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    /// Send a request, refreshing the access token at most once.
    #[instrument(skip(self, request), fields(method = %request.method(), path = request.path()))]
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut attempt = RequestAttempt::first(request);
        let mut bearer = self.inner.session.access_token().await;

        loop {
            let response = self
                .inner
                .client
                .execute(&attempt, bearer.as_ref(), &self.cancel)
                .await?;

            if !response.is_unauthorized() {
                return response.into_result();
            }

            let Some(retry) = attempt.retry() else {
                debug!("Still unauthorized after refresh");
                return response.into_result();
            };

            match self
                .inner
                .refresher
                .refresh(bearer.as_ref(), &self.cancel)
                .await
            {
                Ok(token) => {
                    bearer = Some(token);
                    attempt = retry;
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) => {
                    self.expire(&err).await;
                    return Err(AuthError::SessionExpired.into());
                }
            }
        }
    }

    /// Send a request once with the current bearer token.
    ///
    /// A 401 is returned as a [`StatusError`](farmhand_core::error::StatusError)
    /// without refreshing, clearing the session or emitting events.
    #[instrument(skip(self, request), fields(method = %request.method(), path = request.path()))]
    pub async fn send_once(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let bearer = self.inner.session.access_token().await;
        self.inner
            .client
            .execute(&RequestAttempt::first(request), bearer.as_ref(), &self.cancel)
            .await?
            .into_result()
    }

    /// Refresh the access token now, outside of any failed request.
    ///
    /// Failure is returned to the caller and does not clear the session.
    pub async fn refresh_now(&self) -> Result<AccessToken> {
        self.inner.refresher.refresh_current(&self.cancel).await
    }

    /// Send a request and decode the JSON response.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        self.send(request).await?.json()
    }

    /// Send a request and return the untyped JSON response.
    pub async fn send_value(&self, request: &ApiRequest) -> Result<Value> {
        self.send(request).await?.value()
    }

    async fn expire(&self, cause: &Error) {
        warn!(error = %cause, "Token refresh failed, ending session");
        if let Err(err) = self.inner.session.clear().await {
            warn!(error = %err, "Failed to clear stored credentials");
        }
        self.emit(SessionEvent::Expired);
    }
}

impl std::fmt::Debug for AuthTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTransport")
            .field("base_url", self.inner.client.base_url())
            .field("session", &self.inner.session)
            .finish()
    }
}
