// file: src/installer/ssh.rs
// version: 1.0.0
// guid: a751e3fc-adc9-46e7-b5a2-07db75e3bf7b

//! The SSH provisioning sequence
//!
//! Runs once, top to bottom. Any failing step aborts the run; nothing is
//! rolled back because the container is thrown away anyway.

use super::{AccountManager, PackageManager, SshdConfigurator};
use crate::config::{AgentConfig, TunnelRegion};
use crate::credentials::Credentials;
use crate::executor::{CommandExecutor, TunnelProcess};
use crate::logging::logger::with_async_operation_span;
use crate::network::NetworkDownloader;
use crate::reporter;
use crate::tunnel::{StatusApi, TunnelClient, TunnelEndpoint};
use crate::Result;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

/// What the tunnel client needs from the user
#[derive(Clone)]
pub struct TunnelRequest {
    pub authtoken: String,
    pub region: Option<TunnelRegion>,
    pub custom_server: Option<String>,
}

impl std::fmt::Debug for TunnelRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunnelRequest")
            .field("authtoken", &"********")
            .field("region", &self.region)
            .field("custom_server", &self.custom_server)
            .finish()
    }
}

/// A provisioned SSH session reachable through the relay
pub struct SshSession {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub endpoint: TunnelEndpoint,
    pub credentials: Credentials,
    pub tunnel: Box<dyn TunnelProcess>,
}

pub struct SshProvisioner<'a> {
    executor: &'a dyn CommandExecutor,
    config: &'a AgentConfig,
    downloader: NetworkDownloader,
}

impl<'a> SshProvisioner<'a> {
    pub fn new(executor: &'a dyn CommandExecutor, config: &'a AgentConfig) -> Self {
        Self {
            executor,
            config,
            downloader: NetworkDownloader::new(),
        }
    }

    /// Provision sshd, accounts and the tunnel, then print how to connect
    pub async fn run(&self, request: &TunnelRequest) -> Result<SshSession> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!("Provisioning SSH access (run {})", run_id);

        let packages = &PackageManager::new(self.executor);
        with_async_operation_span("prepare_system", || async move {
            packages.update_cache().await?;
            packages.upgrade().await?;
            packages.unminimize().await
        })
        .await?;

        with_async_operation_span("install_sshd", || async move {
            packages.install(&["openssh-server"]).await
        })
        .await?;

        let sshd = &SshdConfigurator::new(self.executor, &self.config.ssh);
        with_async_operation_span("configure_sshd", || async move {
            sshd.reset_host_keys().await?;
            sshd.enable_keepalive().await
        })
        .await?;

        println!("ECDSA key fingerprint of host:");
        println!("{}", sshd.host_fingerprint().await?);

        let tunnel = TunnelClient::new(self.executor, &self.config.tunnel);
        tunnel.install(&self.downloader).await?;

        let ssh = &self.config.ssh;
        let credentials = Credentials::generate(&ssh.user_name);
        println!("{}", reporter::credentials_block(&credentials));

        let accounts = &AccountManager::new(self.executor);
        let creds = &credentials;
        with_async_operation_span("create_accounts", || async move {
            accounts.create_user(&ssh.user_name, &ssh.user_shell).await?;
            accounts.grant_sudo(&ssh.user_name, &ssh.sudo_group).await?;
            accounts.set_password("root", &creds.root_password).await?;
            accounts
                .set_password(&ssh.user_name, &creds.user_password)
                .await
        })
        .await?;
        sshd.restart().await?;

        tunnel
            .configure(&request.authtoken, request.custom_server.as_deref())
            .await?;
        let mut process = tunnel.start(request.region).await?;

        let api = StatusApi::new(self.config.tunnel.status_api_url.clone());
        let endpoint = match api.fetch_endpoint().await {
            Ok(endpoint) => endpoint,
            Err(e) => {
                if let Err(kill_err) = process.kill() {
                    warn!("Failed to stop tunnel client: {}", kill_err);
                }
                return Err(e);
            }
        };

        println!(
            "{}",
            reporter::connection_block(&endpoint, &ssh.user_name, self.config.vnc.display_port)
        );

        info!("SSH access ready at {} (run {})", endpoint, run_id);
        Ok(SshSession {
            run_id,
            started_at,
            endpoint,
            credentials,
            tunnel: process,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::recording::RecordingExecutor;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_archive() -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            writer
                .start_file("ngrok", zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"#!/bin/sh\nexit 0\n").unwrap();
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    async fn relay_server(tunnels: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ngrok.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(client_archive()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/tunnels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tunnels))
            .mount(&server)
            .await;
        server
    }

    fn config_for(server: &MockServer, root: &Path) -> AgentConfig {
        let ssh_dir = root.join("etc/ssh");
        std::fs::create_dir_all(&ssh_dir).unwrap();
        std::fs::write(ssh_dir.join("ssh_host_ed25519_key"), "old").unwrap();

        let mut config = AgentConfig::default();
        config.ssh.config_dir = ssh_dir;
        config.tunnel.work_dir = root.join("work");
        config.tunnel.client_config_path = root.join("ngrok2/ngrok.yml");
        config.tunnel.client_download_url = format!("{}/ngrok.zip", server.uri());
        config.tunnel.status_api_url = format!("{}/api/tunnels", server.uri());
        config.tunnel.startup_grace_secs = 0;
        config
    }

    fn request() -> TunnelRequest {
        TunnelRequest {
            authtoken: "tok".to_string(),
            region: Some(TunnelRegion::Eu),
            custom_server: None,
        }
    }

    #[tokio::test]
    async fn test_full_sequence() {
        // Arrange
        let server = relay_server(serde_json::json!({
            "tunnels": [{"public_url": "tcp://4.tcp.eu.ngrok.io:15000", "proto": "tcp"}]
        }))
        .await;
        let root = TempDir::new().unwrap();
        let config = config_for(&server, root.path());
        let executor = RecordingExecutor::new().respond("dpkg-query", 1, "");
        let provisioner = SshProvisioner::new(&executor, &config);

        // Act
        let session = provisioner.run(&request()).await.unwrap();

        // Assert
        assert_eq!(session.endpoint.host, "4.tcp.eu.ngrok.io");
        assert_eq!(session.endpoint.port, 15000);
        assert_eq!(session.credentials.user_name, "colab");

        let ngrok = config.tunnel.work_dir.join("ngrok");
        assert!(ngrok.exists());
        assert!(!config.ssh.config_dir.join("ssh_host_ed25519_key").exists());

        let ordered = [
            "apt-get update".to_string(),
            "unminimize".to_string(),
            "apt-get install -y openssh-server".to_string(),
            "ssh-keygen -A".to_string(),
            "useradd -s /bin/bash -m colab".to_string(),
            "adduser colab sudo".to_string(),
            "service ssh restart".to_string(),
            format!("{} authtoken tok", ngrok.display()),
            format!("{} tcp -region eu 22", ngrok.display()),
        ];
        let positions: Vec<usize> = ordered
            .iter()
            .map(|line| {
                executor
                    .position(line)
                    .unwrap_or_else(|| panic!("missing command: {}", line))
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let passwords: Vec<String> = executor
            .calls()
            .into_iter()
            .filter(|c| c.line == "chpasswd")
            .filter_map(|c| c.input)
            .collect();
        assert_eq!(
            passwords,
            vec![
                format!("root:{}", session.credentials.root_password),
                format!("colab:{}", session.credentials.user_password),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_tunnels_stops_client() {
        let server = relay_server(serde_json::json!({ "tunnels": [] })).await;
        let root = TempDir::new().unwrap();
        let config = config_for(&server, root.path());
        let executor = RecordingExecutor::new();
        let provisioner = SshProvisioner::new(&executor, &config);

        let result = provisioner.run(&request()).await;

        assert!(result.is_err());
        assert!(executor.was_killed());
    }

    #[test]
    fn test_request_debug_hides_token() {
        let shown = format!("{:?}", request());
        assert!(!shown.contains("tok\""));
        assert!(shown.contains("********"));
    }
}
