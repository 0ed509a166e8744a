//! Scoped lookup commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use farmhand_http::FarmClient;

use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LookupCommand {
    #[command(subcommand)]
    pub command: LookupSubcommand,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
}

#[derive(Subcommand, Debug)]
pub enum LookupSubcommand {
    /// The logged-in farmer's farm
    MyFarm,

    /// Devices on a farm
    Devices { farm_id: u64 },

    /// Batches on a farm
    Batches { farm_id: u64 },

    /// Activity schedule of a batch
    Schedules { batch_id: u64 },

    /// Readings of a device
    Readings {
        device_id: u64,

        /// Only the most recent reading
        #[arg(long)]
        latest: bool,
    },

    /// Subscription totals
    Subscriptions,
}

pub async fn handle(cmd: LookupCommand, client: &FarmClient) -> Result<()> {
    session::require_login(client).await?;

    let value = match cmd.command {
        LookupSubcommand::MyFarm => client.my_farm().await,
        LookupSubcommand::Devices { farm_id } => client.farm_devices(farm_id).await,
        LookupSubcommand::Batches { farm_id } => client.farm_batches(farm_id).await,
        LookupSubcommand::Schedules { batch_id } => client.batch_schedules(batch_id).await,
        LookupSubcommand::Readings { device_id, latest } if latest => {
            client.latest_reading(device_id).await
        }
        LookupSubcommand::Readings { device_id, .. } => client.device_readings(device_id).await,
        LookupSubcommand::Subscriptions => client.subscription_stats().await,
    }
    .context("Lookup failed")?;

    output::json(&value, cmd.pretty)
}
