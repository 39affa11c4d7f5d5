// file: src/tunnel/client.rs
// version: 1.0.0
// guid: e19e0ba0-735b-458e-bbb3-8fe9e38b233b

//! Installing, configuring and launching the tunnel client

use crate::config::{TunnelConfig, TunnelRegion};
use crate::error::RemoteAccessError;
use crate::executor::{CommandExecutor, TunnelProcess};
use crate::network::{extract_zip, NetworkDownloader};
use crate::Result;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

const CLIENT_BINARY: &str = "ngrok";
const CLIENT_ARCHIVE: &str = "ngrok.zip";
const CLIENT_LOG: &str = "ngrok.log";

pub struct TunnelClient<'a> {
    executor: &'a dyn CommandExecutor,
    config: &'a TunnelConfig,
}

impl<'a> TunnelClient<'a> {
    pub fn new(executor: &'a dyn CommandExecutor, config: &'a TunnelConfig) -> Self {
        Self { executor, config }
    }

    /// Path of the unpacked client binary
    pub fn binary_path(&self) -> PathBuf {
        self.config.work_dir.join(CLIENT_BINARY)
    }

    /// File receiving the client's stdout and stderr
    pub fn log_path(&self) -> PathBuf {
        self.config.work_dir.join(CLIENT_LOG)
    }

    /// Download and unpack the client
    pub async fn install(&self, downloader: &NetworkDownloader) -> Result<PathBuf> {
        info!("Installing tunnel client into {}", self.config.work_dir.display());

        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        let archive = self.config.work_dir.join(CLIENT_ARCHIVE);
        downloader
            .download_with_progress(&self.config.client_download_url, &archive)
            .await?;
        extract_zip(&archive, &self.config.work_dir)?;

        let binary = self.binary_path();
        if !binary.exists() {
            return Err(RemoteAccessError::TunnelError(format!(
                "Archive {} did not contain {}",
                self.config.client_download_url, CLIENT_BINARY
            )));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o700))?;
        }

        Ok(binary)
    }

    /// Store the authtoken and point the client at a custom server
    pub async fn configure(&self, authtoken: &str, custom_server: Option<&str>) -> Result<()> {
        let binary = self.binary_path();
        let binary = binary.to_string_lossy();

        if self.config.client_config_path.exists() {
            info!(
                "Tunnel client config {} exists, keeping its authtoken",
                self.config.client_config_path.display()
            );
        } else {
            let code = self
                .executor
                .run_unchecked(&binary, &["authtoken", authtoken])
                .await?;
            if code != 0 {
                warn!("Storing the authtoken exited with code {}", code);
            }
        }

        if let Some(server) = custom_server {
            info!("Using custom tunnel server {}", server);
            if let Some(parent) = self.config.client_config_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.config.client_config_path)
                .await?;
            file.write_all(custom_server_snippet(server).as_bytes())
                .await?;
            file.flush().await?;
        }

        Ok(())
    }

    /// Launch a TCP tunnel and make sure it survives the startup grace period
    pub async fn start(&self, region: Option<TunnelRegion>) -> Result<Box<dyn TunnelProcess>> {
        let args = command_args(region, self.config.local_port);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let binary = self.binary_path();
        let log = self.log_path();

        info!("Starting tunnel client: {} {}", binary.display(), args.join(" "));
        let mut process = self
            .executor
            .spawn(
                &binary.to_string_lossy(),
                &arg_refs,
                &self.config.work_dir,
                &log,
            )
            .await?;

        tokio::time::sleep(Duration::from_secs(self.config.startup_grace_secs)).await;

        if let Some(code) = process.try_wait()? {
            warn!("Tunnel client output is in {}", log.display());
            return Err(RemoteAccessError::TunnelError(format!(
                "Failed to run ngrok. Return code:{}\nSee runtime log for more info.",
                code
            )));
        }

        Ok(process)
    }
}

/// Arguments for a TCP tunnel to `port`
pub fn command_args(region: Option<TunnelRegion>, port: u16) -> Vec<String> {
    let mut args = vec!["tcp".to_string()];
    if let Some(region) = region {
        args.push("-region".to_string());
        args.push(region.as_str().to_string());
    }
    args.push(port.to_string());
    args
}

/// Client config lines selecting a self-hosted server
pub fn custom_server_snippet(server: &str) -> String {
    format!("\n\nserver_addr: {}\ntrust_host_root_certs: true\n", server)
}
