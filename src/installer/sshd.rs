// file: src/installer/sshd.rs
// version: 1.0.0
// guid: 89737dd2-8716-4928-af49-fcab8bcf0c04

//! OpenSSH server configuration

use crate::config::SshConfig;
use crate::executor::CommandExecutor;
use crate::Result;
use regex::Regex;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

pub struct SshdConfigurator<'a> {
    executor: &'a dyn CommandExecutor,
    config: &'a SshConfig,
}

impl<'a> SshdConfigurator<'a> {
    pub fn new(executor: &'a dyn CommandExecutor, config: &'a SshConfig) -> Self {
        Self { executor, config }
    }

    /// Delete the image's host keys and generate fresh ones
    ///
    /// Container images ship identical host keys to every user, so they are
    /// always replaced. Returns the number of private keys removed.
    pub async fn reset_host_keys(&self) -> Result<usize> {
        info!("Regenerating SSH host keys");

        let key_re = Regex::new(r"^ssh_host_.*_key$").map_err(|e| {
            crate::error::RemoteAccessError::config(format!("Invalid regex pattern: {}", e))
        })?;

        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.config.config_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if key_re.is_match(&name.to_string_lossy()) {
                debug!("Removing host key {}", entry.path().display());
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }

        self.executor.run("ssh-keygen", &["-A"]).await?;
        Ok(removed)
    }

    /// Keep idle sessions alive through the relay
    pub async fn enable_keepalive(&self) -> Result<()> {
        let path = self.sshd_config_path();
        info!(
            "Setting ClientAliveInterval {} in {}",
            self.config.client_alive_interval,
            path.display()
        );

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(
            format!(
                "\n\nClientAliveInterval {}\n",
                self.config.client_alive_interval
            )
            .as_bytes(),
        )
        .await?;
        file.flush().await?;
        Ok(())
    }

    /// Fingerprint and randomart of the ECDSA host key
    pub async fn host_fingerprint(&self) -> Result<String> {
        let key = self.config.config_dir.join("ssh_host_ecdsa_key.pub");
        let key = key.to_string_lossy();
        self.executor.output("ssh-keygen", &["-lvf", key.as_ref()]).await
    }

    /// Restart the daemon so it picks up keys and config
    pub async fn restart(&self) -> Result<()> {
        let code = self
            .executor
            .run_unchecked("service", &[self.config.service_name.as_str(), "restart"])
            .await?;
        if code != 0 {
            warn!("Restarting {} exited with code {}", self.config.service_name, code);
        }
        Ok(())
    }

    fn sshd_config_path(&self) -> PathBuf {
        self.config.config_dir.join("sshd_config")
    }
}
