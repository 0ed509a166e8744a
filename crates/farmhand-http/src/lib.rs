//! farmhand-http - Authenticated HTTP access to the farm management backend.
//!
//! [`AuthTransport`] attaches the session's bearer token to every request and
//! recovers from an expired access token with one refresh and one retry.
//! [`Dashboard`] fans out independent calls and degrades per metric.
//! [`FarmClient`] ties them together.

mod api;
mod auth;
mod client;
mod dashboard;
pub mod endpoints;
mod refresh;
mod request;
mod resources;
mod transport;

pub use api::FarmClient;
pub use auth::{AuthApi, requires_login};
pub use client::{ApiResponse, HttpClient};
pub use dashboard::{Dashboard, settle};
pub use refresh::RefreshCoordinator;
pub use request::{ApiRequest, RequestAttempt};
pub use resources::{Resource, ResourceClient};
pub use transport::{AuthTransport, SessionEvent};

pub use farmhand_core::{
    AccessToken, AdminStats, ApiUrl, ClientConfig, CredentialPair, CredentialStore, Credentials,
    Error, FarmerStats, MemoryStore, Outcome, RefreshToken, Result, Session,
};
