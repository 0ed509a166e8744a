//! HTTP client implementation.

use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use farmhand_core::error::{Error, InvalidInputError, NetworkError, StatusError};
use farmhand_core::{AccessToken, ApiUrl, ClientConfig, Result};

use crate::request::{ApiRequest, RequestAttempt};

/// A buffered backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    status: u16,
    body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Turn a non-2xx response into a [`StatusError`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(StatusError::new(self.status, self.body).into())
        }
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let body = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        Ok(serde_json::from_str(body)?)
    }

    /// Decode the body as an untyped JSON value.
    pub fn value(&self) -> Result<Value> {
        self.json()
    }
}

/// HTTP client for backend requests.
///
/// Performs single round-trips only. It never inspects the status code beyond
/// buffering the response; authorization handling lives in
/// [`AuthTransport`](crate::AuthTransport).
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    /// Create a new client for the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client, config })
    }

    /// Returns the base URL this client is configured for.
    pub fn base_url(&self) -> &ApiUrl {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Dispatch one attempt, attaching `bearer` when present.
    ///
    /// Fails only for network errors, deadline expiry or cancellation; every
    /// HTTP status, including 401, comes back as an [`ApiResponse`].
    #[instrument(
        skip(self, attempt, bearer, cancel),
        fields(
            method = %attempt.request().method(),
            path = attempt.request().path(),
            attempt = attempt.number(),
            authenticated = bearer.is_some(),
        )
    )]
    pub async fn execute(
        &self,
        attempt: &RequestAttempt<'_>,
        bearer: Option<&AccessToken>,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        let request = attempt.request();
        let url = self.config.base_url.endpoint(request.path());
        debug!(%url, "HTTP request");
        trace!(query = ?request.query_pairs(), "query parameters");

        let mut builder = self
            .client
            .request(request.method().clone(), &url)
            .timeout(self.config.timeout);

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }

        if let Some(body) = request.body_value() {
            builder = builder.json(body);
        }

        if let Some(token) = bearer {
            builder = builder.header(AUTHORIZATION, auth_header(token)?);
        }

        let round_trip = async {
            let response = builder.send().await.map_err(|e| self.network_error(e))?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| self.network_error(e))?;
            Ok::<_, Error>(ApiResponse::new(status, body))
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Request cancelled");
                return Err(Error::Cancelled);
            }
            response = round_trip => response?,
        };

        trace!(status = response.status(), "HTTP response");
        Ok(response)
    }

    /// Dispatch a request without credentials and without any 401 handling.
    ///
    /// Used for the token endpoints themselves.
    pub async fn send_unauthenticated(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        self.execute(&RequestAttempt::first(request), None, cancel)
            .await
    }

    fn network_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            NetworkError::Timeout {
                duration_ms: self.config.timeout.as_millis() as u64,
            }
            .into()
        } else {
            err.into()
        }
    }
}

/// Build the `Authorization` header value for a token.
fn auth_header(token: &AccessToken) -> Result<HeaderValue> {
    let mut value =
        HeaderValue::from_str(&token.bearer()).map_err(|_| InvalidInputError::TokenFormat)?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let config = ClientConfig::default();
        let client = HttpClient::new(config.clone()).unwrap();
        assert_eq!(client.base_url(), &config.base_url);
    }

    #[test]
    fn response_classification() {
        assert!(ApiResponse::new(204, "").is_success());
        assert!(ApiResponse::new(401, "").is_unauthorized());
        assert!(!ApiResponse::new(302, "").is_success());
    }

    #[test]
    fn into_result_keeps_body_verbatim() {
        let err = ApiResponse::new(400, r#"{"name":["This field is required."]}"#)
            .into_result()
            .unwrap_err();
        match err {
            Error::Status(status) => {
                assert_eq!(status.status, 400);
                assert!(status.body.contains("This field is required."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_body_decodes_as_null() {
        assert_eq!(ApiResponse::new(204, "").value().unwrap(), Value::Null);
    }

    #[test]
    fn auth_header_is_sensitive_bearer() {
        let value = auth_header(&AccessToken::new("abc")).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer abc");
        assert!(value.is_sensitive());
    }

    #[test]
    fn auth_header_rejects_control_characters() {
        assert!(auth_header(&AccessToken::new("bad\ntoken")).is_err());
    }
}
