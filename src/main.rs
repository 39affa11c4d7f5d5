// file: src/main.rs
// version: 1.0.0
// guid: 93a0045d-6180-4f15-8976-4352dbae8f93

//! Remote Access Agent - Main entry point

use clap::Parser;
use remote_access_agent::{
    cli::{args::Cli, args::Commands, commands::*},
    logging::logger,
    Result,
};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        command,
        verbose,
        quiet,
        config,
    } = Cli::parse();

    // Initialize logging
    logger::init_logger(verbose, quiet)?;

    // Set up signal handling for graceful shutdown
    let shutdown_signal = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        warn!("Received Ctrl+C, initiating graceful shutdown...");
        cleanup_on_exit().await;
    };

    let config_path = config.as_deref();

    // Execute command with signal handling
    let command_future = async {
        match command {
            Commands::Ssh {
                region,
                custom_server,
                check_gpu,
                detach,
            } => {
                ssh_command(
                    config_path,
                    region.map(Into::into),
                    custom_server,
                    check_gpu,
                    detach,
                )
                .await
            }
            Commands::Vnc {
                region,
                custom_server,
                detach,
            } => vnc_command(config_path, region.map(Into::into), custom_server, detach).await,
            Commands::CheckPrereqs => check_prerequisites_command().await,
            Commands::Regions { json } => regions_command(json).await,
        }
    };

    // Run command with signal handling
    tokio::select! {
        result = command_future => result,
        _ = shutdown_signal => {
            warn!("Application interrupted by user");
            std::process::exit(130); // Standard exit code for Ctrl+C
        }
    }
}

/// Stop the tunnel client started by this agent
async fn cleanup_on_exit() {
    info!("Stopping tunnel client...");

    let _ = tokio::process::Command::new("pkill")
        .args(["-f", "ngrok tcp"])
        .output()
        .await;

    info!("Cleanup completed");
}
