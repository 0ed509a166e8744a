//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use farmhand_core::config::DEFAULT_API_URL;

use crate::commands::{
    login::LoginArgs, lookup::LookupCommand, resource::ResourceCommand, stats::StatsCommand,
};

/// Command line client for the farm management backend.
#[derive(Parser, Debug)]
#[command(name = "farmhand")]
#[command(author, version = env!("FARMHAND_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the backend lives and where the session is kept.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Backend API base URL
    #[arg(long, env = "FARMHAND_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Session file (defaults to the platform data directory)
    #[arg(long, env = "FARMHAND_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login(LoginArgs),

    /// Revoke the session and remove stored credentials
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Renew the access token
    RefreshToken,

    /// Create, read, update and delete backend records
    Resource(ResourceCommand),

    /// Dashboard summaries
    Stats(StatsCommand),

    /// Farm, device and batch lookups
    Lookup(LookupCommand),
}
