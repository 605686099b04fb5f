mod auth;
mod cli;
mod client;
mod config;
mod error;
mod format;
mod output;
mod present;
mod reconcile;
mod state;
mod types;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting jobboard - dbt job status dashboard");
    cli.execute().await?;

    Ok(())
}
