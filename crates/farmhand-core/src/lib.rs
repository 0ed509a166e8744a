//! farmhand-core - Core types and traits for the farmhand API client.

pub mod config;
pub mod credentials;
pub mod error;
pub mod session;
pub mod stats;
pub mod store;
pub mod tokens;
pub mod types;

pub use config::ClientConfig;
pub use credentials::Credentials;
pub use error::Error;
pub use session::Session;
pub use stats::{AdminStats, FarmerStats, Outcome};
pub use store::{CredentialStore, MemoryStore};
pub use tokens::{AccessToken, CredentialPair, RefreshToken};
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
