//! Dashboard summaries built from concurrent backend calls.

use std::future::Future;

use futures_util::join;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use farmhand_core::stats::{AdminSources, FarmSources};
use farmhand_core::{AdminStats, FarmerStats, Outcome, Result};

use crate::endpoints::{farm_batches, farm_devices, recent_readings};
use crate::request::ApiRequest;
use crate::resources::Resource;
use crate::transport::AuthTransport;

/// Readings fetched for a farm snapshot.
const READING_SAMPLE: u32 = 10;

/// Await one labelled source and record its outcome.
///
/// A failure becomes [`Outcome::Rejected`] and is logged; run sources
/// together with `join!` so one failure never stops the others.
pub async fn settle<T>(label: &str, source: impl Future<Output = Result<T>>) -> Outcome<T> {
    let result = source.await;
    if let Err(err) = &result {
        warn!(source = label, error = %err, "Dashboard source failed, using default");
    }
    Outcome::from(result)
}

/// Organisation and farm snapshots.
///
/// Neither summary can fail: each metric comes from its own call and falls
/// back to its default when that call fails.
#[derive(Debug, Clone)]
pub struct Dashboard {
    transport: AuthTransport,
}

impl Dashboard {
    pub fn new(transport: AuthTransport) -> Self {
        Self { transport }
    }

    async fn list(&self, resource: Resource) -> Outcome<Value> {
        let request = ApiRequest::get(resource.path());
        settle(resource.name(), self.transport.send_value(&request)).await
    }

    /// Counts across the whole organisation, for administrators.
    #[instrument(skip(self))]
    pub async fn admin_stats(&self) -> AdminStats {
        let (users, farmers, farms, devices, batches, subscriptions) = join!(
            self.list(Resource::Users),
            self.list(Resource::Farmers),
            self.list(Resource::Farms),
            self.list(Resource::Devices),
            self.list(Resource::Batches),
            self.list(Resource::FarmerSubscriptions),
        );

        let stats = AdminStats::from_sources(AdminSources {
            users,
            farmers,
            farms,
            devices,
            batches,
            subscriptions,
        });
        debug!(?stats, "Admin stats computed");
        stats
    }

    /// Batch, device and reading figures for one farm.
    #[instrument(skip(self))]
    pub async fn farmer_stats(&self, farm_id: u64) -> FarmerStats {
        let batches = farm_batches(farm_id);
        let devices = farm_devices(farm_id);
        let readings = recent_readings(READING_SAMPLE);

        let (batches, devices, readings) = join!(
            settle("batches", self.transport.send_value(&batches)),
            settle("devices", self.transport.send_value(&devices)),
            settle("readings", self.transport.send_value(&readings)),
        );

        let stats = FarmerStats::from_sources(FarmSources {
            batches,
            devices,
            readings,
        });
        debug!(?stats, "Farm stats computed");
        stats
    }
}
