//! Dashboard summaries and the list-envelope helpers they are built from.
//!
//! Every metric is computed independently from its own source. A source that
//! failed contributes its default (0 or an empty list) and never prevents the
//! other metrics from being filled in.

use serde::Serialize;
use serde_json::Value;

use crate::Error;

/// Fixed health score reported by the organisation snapshot.
pub const SYSTEM_HEALTH: u8 = 95;

/// Fixed health score reported by the farm snapshot.
pub const FARM_HEALTH: u8 = 92;

/// How many of the fetched readings are echoed back in a farm snapshot.
pub const RECENT_READINGS: usize = 5;

/// Batch status that counts as active.
pub const ACTIVE_BATCH_STATUS: &str = "Active";

/// The settled result of one fanned-out call.
#[derive(Debug)]
pub enum Outcome<T> {
    Fulfilled(T),
    Rejected(Error),
}

impl<T> Outcome<T> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Outcome::Fulfilled(_))
    }

    /// The fulfilled value, or `default` if the call was rejected.
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Outcome::Fulfilled(value) => value,
            Outcome::Rejected(_) => default,
        }
    }

    /// Apply `f` to a fulfilled value, or return `default`.
    pub fn map_or<U>(self, default: U, f: impl FnOnce(T) -> U) -> U {
        match self {
            Outcome::Fulfilled(value) => f(value),
            Outcome::Rejected(_) => default,
        }
    }
}

impl<T> From<crate::Result<T>> for Outcome<T> {
    fn from(result: crate::Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Fulfilled(value),
            Err(err) => Outcome::Rejected(err),
        }
    }
}

/// The `count` field of a list payload; missing or non-numeric counts are 0.
pub fn list_count(payload: &Value) -> u64 {
    payload.get("count").and_then(Value::as_u64).unwrap_or(0)
}

/// The items of a list payload.
///
/// Paginated payloads carry them under `results`; unpaginated endpoints
/// return a bare array. Anything else yields no items.
pub fn list_items(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Numeric field that may be encoded as a JSON number or a decimal string.
fn number_field(item: &Value, field: &str) -> Option<f64> {
    match item.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Organisation-wide snapshot for administrators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: u64,
    pub total_farmers: u64,
    pub active_farms: u64,
    pub total_devices: u64,
    pub active_batches: u64,
    pub active_subscriptions: u64,
    pub system_health: u8,
    pub pending_alerts: u64,
}

/// Raw outcomes of the six organisation-wide list calls.
#[derive(Debug)]
pub struct AdminSources {
    pub users: Outcome<Value>,
    pub farmers: Outcome<Value>,
    pub farms: Outcome<Value>,
    pub devices: Outcome<Value>,
    pub batches: Outcome<Value>,
    pub subscriptions: Outcome<Value>,
}

impl AdminStats {
    /// Fold the six list outcomes into a snapshot.
    pub fn from_sources(sources: AdminSources) -> Self {
        let count = |outcome: Outcome<Value>| outcome.map_or(0, |v| list_count(&v));

        Self {
            total_users: count(sources.users),
            total_farmers: count(sources.farmers),
            active_farms: count(sources.farms),
            total_devices: count(sources.devices),
            active_batches: count(sources.batches),
            active_subscriptions: count(sources.subscriptions),
            system_health: SYSTEM_HEALTH,
            pending_alerts: 0,
        }
    }
}

/// Snapshot of a single farm.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerStats {
    pub total_batches: u64,
    pub active_batches: u64,
    pub total_birds: u64,
    pub total_devices: u64,
    pub active_devices: u64,
    pub recent_readings: Vec<Value>,
    pub avg_temperature: f64,
    pub farm_health: u8,
}

/// Raw outcomes of the three farm-scoped calls.
#[derive(Debug)]
pub struct FarmSources {
    pub batches: Outcome<Value>,
    pub devices: Outcome<Value>,
    pub readings: Outcome<Value>,
}

impl FarmerStats {
    /// Reduce the three farm outcomes into a snapshot.
    pub fn from_sources(sources: FarmSources) -> Self {
        let items = |outcome: Outcome<Value>| outcome.map_or(Vec::new(), list_items);

        let batches = items(sources.batches);
        let devices = items(sources.devices);
        let mut readings = items(sources.readings);

        let active_batches = batches
            .iter()
            .filter(|b| b.get("status").and_then(Value::as_str) == Some(ACTIVE_BATCH_STATUS))
            .count();

        let total_birds = batches
            .iter()
            .map(|b| b.get("current_count").and_then(Value::as_u64).unwrap_or(0))
            .fold(0u64, u64::saturating_add);

        let active_devices = devices
            .iter()
            .filter(|d| d.get("is_active").and_then(Value::as_bool) == Some(true))
            .count();

        let avg_temperature = if readings.is_empty() {
            0.0
        } else {
            let sum: f64 = readings
                .iter()
                .map(|r| number_field(r, "value").unwrap_or(0.0))
                .sum();
            sum / readings.len() as f64
        };

        readings.truncate(RECENT_READINGS);

        Self {
            total_batches: batches.len() as u64,
            active_batches: active_batches as u64,
            total_birds,
            total_devices: devices.len() as u64,
            active_devices: active_devices as u64,
            recent_readings: readings,
            avg_temperature,
            farm_health: FARM_HEALTH,
        }
    }
}
