//! `raidassist-auth`: log in to Bungie.net and hand out access tokens.

mod commands;
mod telemetry;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use raidassist_infra::config;
use tracing::info;

#[derive(Parser)]
#[command(name = "raidassist-auth", version, about = "Bungie.net login for RaidAssist")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Settings file. Defaults to ./raidassist.toml, then the user config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate the OAuth configuration; exits 1 when invalid.
    CheckConfig,
    /// Print a valid access token, logging in if needed.
    Token,
    /// Run the browser login even if a session exists.
    Login,
    /// Delete the stored session.
    Logout,
    /// Show the session state without contacting Bungie.net.
    Status {
        /// Print the status as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _log_guard = telemetry::init(cli.json_logs);

    info!(version = env!("CARGO_PKG_VERSION"), "raidassist-auth starting");

    let settings = match cli.config {
        Some(path) => config::load_from_file(Some(path))?,
        None => config::load()?,
    };

    commands::run(cli.command, &settings).await
}
