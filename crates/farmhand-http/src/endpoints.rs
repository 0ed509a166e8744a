//! Backend endpoint paths and request/response bodies.

use serde::{Deserialize, Serialize};

use crate::request::ApiRequest;

// ============================================================================
// Endpoint Paths
// ============================================================================

/// Exchange a username/password for a token pair.
pub const TOKEN: &str = "accounts/token/";

/// Mint a new access token from a refresh token.
pub const TOKEN_REFRESH: &str = "accounts/token/refresh/";

/// Revoke a refresh token.
pub const TOKEN_BLACKLIST: &str = "accounts/token/blacklist/";

/// The authenticated user's profile.
pub const CURRENT_USER: &str = "accounts/me/";

/// The authenticated farmer's own farm.
pub const MY_FARM: &str = "accounts/farmers/my_farm/";

/// Subscription totals.
pub const SUBSCRIPTION_STATS: &str = "subscriptions/stats/";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// Body for refresh and blacklist calls.
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response from the refresh endpoint.
///
/// `refresh` is only present when the backend rotates refresh tokens.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

// ============================================================================
// Scoped Lookups
// ============================================================================

/// Devices installed on one farm.
pub fn farm_devices(farm_id: u64) -> ApiRequest {
    ApiRequest::get("farms/devices/").query("farm", farm_id)
}

/// Batches raised on one farm.
pub fn farm_batches(farm_id: u64) -> ApiRequest {
    ApiRequest::get("batches/batches/").query("farmID", farm_id)
}

/// Activity schedule for one batch.
pub fn batch_schedules(batch_id: u64) -> ApiRequest {
    ApiRequest::get("batches/activity-schedules/").query("batchID", batch_id)
}

/// Readings reported by one device.
pub fn device_readings(device_id: u64) -> ApiRequest {
    ApiRequest::get("sensors/readings/").query("deviceID", device_id)
}

/// The most recent reading of one device.
pub fn latest_reading(device_id: u64) -> ApiRequest {
    device_readings(device_id).query("latest", true)
}

/// The newest readings across all devices.
pub fn recent_readings(limit: u32) -> ApiRequest {
    ApiRequest::get("sensors/readings/").query("limit", limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_response_without_rotation() {
        let resp: RefreshResponse = serde_json::from_str(r#"{"access":"a2"}"#).unwrap();
        assert_eq!(resp.access, "a2");
        assert!(resp.refresh.is_none());
    }

    #[test]
    fn refresh_response_with_rotation() {
        let resp: RefreshResponse =
            serde_json::from_str(r#"{"access":"a2","refresh":"r2"}"#).unwrap();
        assert_eq!(resp.refresh.as_deref(), Some("r2"));
    }

    #[test]
    fn latest_reading_query() {
        let req = latest_reading(7);
        assert_eq!(req.path(), "sensors/readings/");
        assert_eq!(
            req.query_pairs(),
            &[
                ("deviceID".to_string(), "7".to_string()),
                ("latest".to_string(), "true".to_string())
            ]
        );
    }
}
