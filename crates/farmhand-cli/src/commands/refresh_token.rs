//! Refresh token command implementation.

use anyhow::{Context, Result};
use colored::Colorize;

use farmhand_http::FarmClient;

use crate::output;
use crate::session;

pub async fn run(client: &FarmClient) -> Result<()> {
    session::require_login(client).await?;

    eprintln!("{}", "Refreshing session...".dimmed());

    client
        .refresh_session()
        .await
        .context("Failed to refresh session")?;

    output::success("Session refreshed successfully");
    Ok(())
}
