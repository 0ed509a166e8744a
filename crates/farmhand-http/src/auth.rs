//! Login, logout and token endpoints.

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use farmhand_core::error::{AuthError, Error};
use farmhand_core::{AccessToken, CredentialPair, Credentials, RefreshToken, Result};

use crate::endpoints::{
    CURRENT_USER, RefreshRequest, RefreshResponse, TOKEN, TOKEN_BLACKLIST, TOKEN_REFRESH,
    TokenPairResponse,
};
use crate::request::ApiRequest;
use crate::transport::{AuthTransport, SessionEvent};

/// Account and token operations.
#[derive(Debug, Clone)]
pub struct AuthApi {
    transport: AuthTransport,
}

impl AuthApi {
    pub fn new(transport: AuthTransport) -> Self {
        Self { transport }
    }

    /// Exchange credentials for a token pair and store it in the session.
    ///
    /// The token endpoint is called without a bearer token and without the
    /// refresh protocol, so a wrong password is reported as
    /// [`AuthError::InvalidCredentials`] instead of triggering a refresh.
    #[instrument(skip(self, credentials), fields(username = credentials.username()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<CredentialPair> {
        info!("Logging in");

        let request = ApiRequest::post(TOKEN).json(credentials)?;
        let response = self
            .transport
            .client()
            .send_unauthenticated(&request, self.transport.cancellation())
            .await?;

        if response.is_unauthorized() {
            return Err(AuthError::InvalidCredentials.into());
        }

        let tokens: TokenPairResponse = response.into_result()?.json()?;
        let pair = CredentialPair::new(
            AccessToken::new(tokens.access),
            Some(RefreshToken::new(tokens.refresh)),
        );

        self.transport.session().set(pair.clone()).await?;
        self.transport.emit(SessionEvent::LoggedIn);

        debug!("Login successful");
        Ok(pair)
    }

    /// Revoke the refresh token on the backend, then clear local credentials.
    ///
    /// The revocation is a single attempt: an expired access token is not
    /// refreshed first, so logging out never emits [`SessionEvent::Expired`].
    /// A failed revocation is logged and ignored. Local credentials are
    /// cleared regardless; only a failure to clear them is returned.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        info!("Logging out");

        if let Some(refresh) = self.transport.session().refresh_token().await
            && let Err(err) = self.blacklist(&refresh).await
        {
            warn!(error = %err, "Failed to blacklist refresh token");
        }

        self.transport.session().clear().await?;
        self.transport.emit(SessionEvent::LoggedOut);
        Ok(())
    }

    async fn blacklist(&self, refresh: &RefreshToken) -> Result<()> {
        let request = ApiRequest::post(TOKEN_BLACKLIST).json(&RefreshRequest {
            refresh: refresh.as_str(),
        })?;
        self.transport.send_once(&request).await.map(|_| ())
    }

    /// Profile of the authenticated user.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<Value> {
        self.transport
            .send_value(&ApiRequest::get(CURRENT_USER))
            .await
    }

    /// Call the refresh endpoint with an explicit refresh token.
    ///
    /// This is a plain authenticated call; the result is returned as-is and
    /// the session is not updated. Use
    /// [`FarmClient::refresh_session`](crate::FarmClient::refresh_session)
    /// to renew the stored session.
    #[instrument(skip(self, refresh))]
    pub async fn refresh_token(&self, refresh: &RefreshToken) -> Result<RefreshResponse> {
        let request = ApiRequest::post(TOKEN_REFRESH).json(&RefreshRequest {
            refresh: refresh.as_str(),
        })?;
        self.transport.send_json(&request).await
    }
}

/// Whether `err` means the user has to log in again.
pub fn requires_login(err: &Error) -> bool {
    matches!(
        err,
        Error::Auth(AuthError::SessionExpired | AuthError::InvalidCredentials)
    )
}
