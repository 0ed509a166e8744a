//! Logout command implementation.

use anyhow::{Context, Result};

use farmhand_http::FarmClient;

use crate::output;

pub async fn run(client: &FarmClient) -> Result<()> {
    if !client.session().is_authenticated().await {
        output::success("Not logged in");
        return Ok(());
    }

    client
        .auth()
        .logout()
        .await
        .context("Failed to remove stored session")?;

    output::success("Logged out");
    Ok(())
}
