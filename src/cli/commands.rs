// file: src/cli/commands.rs
// version: 1.0.0
// guid: 1f7b3f3a-4a65-4689-8152-efcbb1c7a54a

//! Command implementations for the CLI

use super::prompt::{ConsolePrompter, Prompter};
use crate::{
    config::{loader::ConfigLoader, AgentConfig, TunnelConfig, TunnelRegion},
    error::RemoteAccessError,
    executor::{CommandExecutor, LocalExecutor},
    installer::{gpu_available, SshProvisioner, SshSession, TunnelRequest, VncProvisioner},
    reporter,
    utils::system::{SystemUtils, REQUIRED_COMMANDS},
    Result,
};
use colored::Colorize;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// How often a held session checks that the tunnel client is still alive
const TUNNEL_WATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Load the config file, or the defaults when none is given
pub fn load_config(path: Option<&str>) -> Result<AgentConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path);
            ConfigLoader::new().load_agent_config(path)
        }
        None => Ok(AgentConfig::default()),
    }
}

/// Apply command line flags on top of the loaded configuration
pub fn apply_overrides(
    config: &mut AgentConfig,
    region: Option<TunnelRegion>,
    custom_server: Option<String>,
    check_gpu: bool,
) -> Result<()> {
    if region.is_some() {
        config.tunnel.region = region;
    }
    if custom_server.is_some() {
        config.tunnel.custom_server = custom_server;
    }
    config.check_gpu |= check_gpu;
    config.validate()
}

/// Set up SSH access
pub async fn ssh_command(
    config_path: Option<&str>,
    region: Option<TunnelRegion>,
    custom_server: Option<String>,
    check_gpu: bool,
    detach: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, region, custom_server, check_gpu)?;

    let executor = LocalExecutor::new();
    match provision(&executor, &config, &ConsolePrompter, false).await? {
        Some(session) => hold_session(session, detach).await,
        None => Ok(()),
    }
}

/// Set up SSH access, then a VNC desktop
pub async fn vnc_command(
    config_path: Option<&str>,
    region: Option<TunnelRegion>,
    custom_server: Option<String>,
    detach: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, region, custom_server, true)?;

    let executor = LocalExecutor::new();
    match provision(&executor, &config, &ConsolePrompter, true).await? {
        Some(session) => hold_session(session, detach).await,
        None => Ok(()),
    }
}

/// Run the SSH sequence, followed by the VNC desktop when `with_vnc` is set
///
/// Returns `None` when the user declined to continue without a GPU.
pub async fn provision(
    executor: &dyn CommandExecutor,
    config: &AgentConfig,
    prompter: &dyn Prompter,
    with_vnc: bool,
) -> Result<Option<SshSession>> {
    let Some(session) = setup_ssh(executor, config, prompter).await? else {
        return Ok(None);
    };

    if with_vnc {
        VncProvisioner::new(executor, &config.vnc, &config.tunnel.work_dir)
            .run(&config.ssh.user_name)
            .await?;
    }

    Ok(Some(session))
}

/// Ask for what the tunnel needs and run the SSH sequence
pub async fn setup_ssh(
    executor: &dyn CommandExecutor,
    config: &AgentConfig,
    prompter: &dyn Prompter,
) -> Result<Option<SshSession>> {
    if !gpu_check_passes(executor, config.check_gpu, prompter).await? {
        warn!("No GPU available, stopping without provisioning");
        return Ok(None);
    }

    let authtoken = prompter.authtoken()?;
    let region = choose_region(&config.tunnel, || prompter.region())?;

    let request = TunnelRequest {
        authtoken,
        region,
        custom_server: config.tunnel.custom_server.clone(),
    };

    SshProvisioner::new(executor, config)
        .run(&request)
        .await
        .map(Some)
}

/// Whether provisioning goes ahead after the optional GPU check
pub async fn gpu_check_passes(
    executor: &dyn CommandExecutor,
    check_gpu: bool,
    prompter: &dyn Prompter,
) -> Result<bool> {
    if !check_gpu || gpu_available(executor).await {
        return Ok(true);
    }

    println!("{}", reporter::gpu_warning());
    prompter.confirm("Do you want to continue? [y/n]")
}

/// Configured region first; a custom server has no regions; otherwise ask
pub fn choose_region<F>(config: &TunnelConfig, ask: F) -> Result<Option<TunnelRegion>>
where
    F: FnOnce() -> Result<Option<TunnelRegion>>,
{
    match (config.region, &config.custom_server) {
        (Some(region), _) => Ok(Some(region)),
        (None, Some(_)) => Ok(None),
        (None, None) => ask(),
    }
}

/// Keep the agent alive while the tunnel client runs
async fn hold_session(mut session: SshSession, detach: bool) -> Result<()> {
    if detach {
        info!(
            "Leaving tunnel client running (pid {:?})",
            session.tunnel.id()
        );
        return Ok(());
    }

    info!(
        "Tunnel to {} up since {}; press Ctrl+C to stop",
        session.endpoint,
        session.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    loop {
        tokio::time::sleep(TUNNEL_WATCH_INTERVAL).await;
        if let Some(code) = session.tunnel.try_wait()? {
            return Err(RemoteAccessError::TunnelError(format!(
                "Tunnel client exited with code {} (run {})",
                code, session.run_id
            )));
        }
    }
}

/// Check system prerequisites
pub async fn check_prerequisites_command() -> Result<()> {
    info!("Checking system prerequisites for remote access provisioning");

    let missing = SystemUtils::missing_commands(REQUIRED_COMMANDS);
    if missing.is_empty() {
        println!("{} All required system commands are available", "✓".green());
    } else {
        println!(
            "{} Missing required commands: {}",
            "✗".red(),
            missing.join(", ")
        );
    }

    if SystemUtils::is_root() {
        println!("{} Running as root", "✓".green());
    } else {
        println!(
            "{} Not running as root - package installation and account setup will fail",
            "✗".red()
        );
    }

    let executor = LocalExecutor::new();
    if gpu_available(&executor).await {
        println!("{} GPU available", "✓".green());
    } else {
        println!("{} No GPU detected", "⚠".yellow());
    }

    Ok(())
}

#[derive(Serialize)]
struct RegionEntry {
    code: &'static str,
    description: &'static str,
}

/// List tunnel relay regions
pub async fn regions_command(json_output: bool) -> Result<()> {
    if json_output {
        let entries: Vec<RegionEntry> = TunnelRegion::all()
            .iter()
            .map(|r| RegionEntry {
                code: r.as_str(),
                description: r.description(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("{}", reporter::region_menu());
    }
    Ok(())
}
