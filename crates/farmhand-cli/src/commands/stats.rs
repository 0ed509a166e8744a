//! Dashboard summary commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use farmhand_http::FarmClient;

use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct StatsCommand {
    #[command(subcommand)]
    pub command: StatsSubcommand,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
}

#[derive(Subcommand, Debug)]
pub enum StatsSubcommand {
    /// Organisation-wide counts
    Admin,

    /// Figures for one farm
    Farm {
        /// Farm ID (defaults to the logged-in farmer's farm)
        #[arg(long)]
        farm_id: Option<u64>,
    },
}

pub async fn handle(cmd: StatsCommand, client: &FarmClient) -> Result<()> {
    session::require_login(client).await?;

    match cmd.command {
        StatsSubcommand::Admin => {
            let stats = client.dashboard().admin_stats().await;
            output::json(&stats, cmd.pretty)
        }
        StatsSubcommand::Farm { farm_id } => {
            let farm_id = match farm_id {
                Some(id) => id,
                None => own_farm_id(client).await?,
            };
            let stats = client.dashboard().farmer_stats(farm_id).await;
            output::json(&stats, cmd.pretty)
        }
    }
}

async fn own_farm_id(client: &FarmClient) -> Result<u64> {
    let farm = client.my_farm().await.context("Failed to fetch your farm")?;
    farm.get("id")
        .and_then(serde_json::Value::as_u64)
        .context("Farm response has no numeric id")
}
