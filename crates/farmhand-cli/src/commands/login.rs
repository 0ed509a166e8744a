//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use farmhand_core::Credentials;
use farmhand_http::FarmClient;

use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account username
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long, env = "FARMHAND_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: LoginArgs, client: &FarmClient) -> Result<()> {
    let credentials = Credentials::new(&args.username, &args.password);

    eprintln!("{}", "Logging in...".dimmed());

    client
        .auth()
        .login(&credentials)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    output::field("User", &args.username);
    output::field("API", client.transport().client().base_url().as_str());

    Ok(())
}
