//! High-level client facade.

use serde_json::Value;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use farmhand_core::{AccessToken, ClientConfig, Result, Session};

use crate::auth::AuthApi;
use crate::client::HttpClient;
use crate::dashboard::Dashboard;
use crate::endpoints::{
    MY_FARM, SUBSCRIPTION_STATS, batch_schedules, device_readings, farm_batches, farm_devices,
    latest_reading,
};
use crate::request::ApiRequest;
use crate::resources::{Resource, ResourceClient};
use crate::transport::{AuthTransport, SessionEvent};

/// Entry point for talking to the farm management backend.
///
/// Every call goes through one shared [`AuthTransport`], so all of them see
/// the same session and share token refreshes.
#[derive(Debug, Clone)]
pub struct FarmClient {
    transport: AuthTransport,
}

impl FarmClient {
    pub fn new(config: ClientConfig, session: Session) -> Result<Self> {
        let client = HttpClient::new(config)?;
        Ok(Self {
            transport: AuthTransport::new(client, session),
        })
    }

    pub fn transport(&self) -> &AuthTransport {
        &self.transport
    }

    pub fn session(&self) -> &Session {
        self.transport.session()
    }

    /// Subscribe to login, refresh, expiry and logout events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.transport.subscribe()
    }

    /// A client whose calls stop when `cancel` fires.
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            transport: self.transport.with_cancellation(cancel),
        }
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.transport.clone())
    }

    pub fn resource(&self, resource: Resource) -> ResourceClient {
        ResourceClient::new(self.transport.clone(), resource)
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(self.transport.clone())
    }

    /// Renew the stored access token with the stored refresh token.
    ///
    /// Shares the single-flight refresh used by requests. A failure leaves
    /// the session in place.
    #[instrument(skip(self))]
    pub async fn refresh_session(&self) -> Result<AccessToken> {
        self.transport.refresh_now().await
    }

    /// The logged-in farmer's farm.
    #[instrument(skip(self))]
    pub async fn my_farm(&self) -> Result<Value> {
        self.transport.send_value(&ApiRequest::get(MY_FARM)).await
    }

    #[instrument(skip(self))]
    pub async fn farm_devices(&self, farm_id: u64) -> Result<Value> {
        self.transport.send_value(&farm_devices(farm_id)).await
    }

    #[instrument(skip(self))]
    pub async fn farm_batches(&self, farm_id: u64) -> Result<Value> {
        self.transport.send_value(&farm_batches(farm_id)).await
    }

    #[instrument(skip(self))]
    pub async fn batch_schedules(&self, batch_id: u64) -> Result<Value> {
        self.transport.send_value(&batch_schedules(batch_id)).await
    }

    #[instrument(skip(self))]
    pub async fn device_readings(&self, device_id: u64) -> Result<Value> {
        self.transport.send_value(&device_readings(device_id)).await
    }

    #[instrument(skip(self))]
    pub async fn latest_reading(&self, device_id: u64) -> Result<Value> {
        self.transport.send_value(&latest_reading(device_id)).await
    }

    #[instrument(skip(self))]
    pub async fn subscription_stats(&self) -> Result<Value> {
        self.transport
            .send_value(&ApiRequest::get(SUBSCRIPTION_STATS))
            .await
    }
}
