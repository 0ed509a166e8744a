//! Subcommand implementations.

pub mod login;
mod logout;
pub mod lookup;
mod refresh_token;
pub mod resource;
pub mod stats;
mod whoami;

use std::io::{self, Read};

use anyhow::{Context, Result};
use serde_json::Value;

use farmhand_http::FarmClient;

use crate::cli::Commands;

pub async fn handle(command: Commands, client: &FarmClient) -> Result<()> {
    match command {
        Commands::Login(args) => login::run(args, client).await,
        Commands::Logout => logout::run(client).await,
        Commands::Whoami => whoami::run(client).await,
        Commands::RefreshToken => refresh_token::run(client).await,
        Commands::Resource(cmd) => resource::handle(cmd, client).await,
        Commands::Stats(cmd) => stats::handle(cmd, client).await,
        Commands::Lookup(cmd) => lookup::handle(cmd, client).await,
    }
}

/// Read a JSON document from a file, or from stdin when `source` is `-`.
pub(crate) fn read_json(source: &str) -> Result<Value> {
    if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        serde_json::from_str(&buf).context("Invalid JSON from stdin")
    } else {
        let content = std::fs::read_to_string(source).context("Failed to read JSON file")?;
        serde_json::from_str(&content).context("Invalid JSON in file")
    }
}
