//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::ApiUrl;

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/v1";

/// Per-request deadline used when nothing else is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every request a client makes.
///
/// `timeout` is the deadline for a single network round-trip. A request that
/// triggers a refresh gets one deadline for the first call, one for the
/// refresh and one for the retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: ApiUrl,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    /// Configuration for `base_url` with default timeout and user agent.
    pub fn new(base_url: ApiUrl) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("farmhand/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(ApiUrl::new(DEFAULT_API_URL).expect("DEFAULT_API_URL is a valid loopback URL"))
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url.host(), Some("127.0.0.1"));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.user_agent.starts_with("farmhand/"));
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("test-agent");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn timeout_serializes_as_seconds() {
        let config = ClientConfig::default().with_timeout(Duration::from_secs(7));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout"], 7);

        let back: ClientConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
