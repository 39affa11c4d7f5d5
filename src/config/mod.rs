// file: src/config/mod.rs
// version: 1.0.0
// guid: 3870bbef-99fa-4725-8651-9d24502824a5

//! Configuration module for the remote access agent
//!
//! Every field has a default, so the agent runs without a config file. A YAML
//! file loaded through [`loader::ConfigLoader`] overrides the defaults and CLI
//! flags override the file.

pub mod loader;

use crate::error::RemoteAccessError;
use crate::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Datacenter regions offered by the tunnel relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TunnelRegion {
    Us,
    Eu,
    Ap,
    Au,
    Sa,
    Jp,
    In,
}

impl TunnelRegion {
    /// Get the region code passed to the tunnel client
    pub fn as_str(&self) -> &'static str {
        match self {
            TunnelRegion::Us => "us",
            TunnelRegion::Eu => "eu",
            TunnelRegion::Ap => "ap",
            TunnelRegion::Au => "au",
            TunnelRegion::Sa => "sa",
            TunnelRegion::Jp => "jp",
            TunnelRegion::In => "in",
        }
    }

    /// Human readable location of the region
    pub fn description(&self) -> &'static str {
        match self {
            TunnelRegion::Us => "United States (Ohio)",
            TunnelRegion::Eu => "Europe (Frankfurt)",
            TunnelRegion::Ap => "Asia/Pacific (Singapore)",
            TunnelRegion::Au => "Australia (Sydney)",
            TunnelRegion::Sa => "South America (Sao Paulo)",
            TunnelRegion::Jp => "Japan (Tokyo)",
            TunnelRegion::In => "India (Mumbai)",
        }
    }

    /// All regions in menu order
    pub fn all() -> [TunnelRegion; 7] {
        [
            TunnelRegion::Us,
            TunnelRegion::Eu,
            TunnelRegion::Ap,
            TunnelRegion::Au,
            TunnelRegion::Sa,
            TunnelRegion::Jp,
            TunnelRegion::In,
        ]
    }
}

impl std::str::FromStr for TunnelRegion {
    type Err = RemoteAccessError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        TunnelRegion::all()
            .into_iter()
            .find(|region| region.as_str() == code)
            .ok_or_else(|| RemoteAccessError::ValidationError(format!("Unknown region: {}", s.trim())))
    }
}

impl std::fmt::Display for TunnelRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Tunnel relay client settings
    pub tunnel: TunnelConfig,
    /// SSH daemon and login account settings
    pub ssh: SshConfig,
    /// VNC desktop settings
    pub vnc: VncConfig,
    /// Ask before provisioning on a machine without a GPU
    pub check_gpu: bool,
}

/// Tunnel relay client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    /// Relay datacenter; prompted for when unset and no custom server is used
    pub region: Option<TunnelRegion>,
    /// Self-hosted relay address (`host:port`)
    pub custom_server: Option<String>,
    /// Where the tunnel client archive is downloaded from
    pub client_download_url: String,
    /// Directory the client is downloaded and unpacked into
    pub work_dir: PathBuf,
    /// The client's own config file, written by `ngrok authtoken`
    pub client_config_path: PathBuf,
    /// Local status API listing active tunnels
    pub status_api_url: String,
    /// Seconds to wait after launch before checking the client is alive
    pub startup_grace_secs: u64,
    /// Local port exposed through the relay
    pub local_port: u16,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            region: None,
            custom_server: None,
            client_download_url:
                "https://bin.equinox.io/c/4VmDzA7iaHb/ngrok-stable-linux-amd64.zip".to_string(),
            work_dir: PathBuf::from("."),
            client_config_path: PathBuf::from("/root/.ngrok2/ngrok.yml"),
            status_api_url: "http://localhost:4040/api/tunnels".to_string(),
            startup_grace_secs: 2,
            local_port: 22,
        }
    }
}

/// SSH daemon and login account settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// Directory holding `sshd_config` and the host keys
    pub config_dir: PathBuf,
    /// `ClientAliveInterval` appended to `sshd_config`
    pub client_alive_interval: u32,
    /// Unprivileged login account created for the session
    pub user_name: String,
    /// Login shell for that account
    pub user_shell: String,
    /// Group granting sudo rights
    pub sudo_group: String,
    /// Service name used with `service <name> restart`
    pub service_name: String,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("/etc/ssh"),
            client_alive_interval: 120,
            user_name: "colab".to_string(),
            user_shell: "/bin/bash".to_string(),
            sudo_group: "sudo".to_string(),
            service_name: "ssh".to_string(),
        }
    }
}

/// VNC desktop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VncConfig {
    pub libjpeg_turbo_version: String,
    pub turbovnc_version: String,
    /// Mirror prefix for both `.deb` downloads
    pub download_base: String,
    /// Desktop environment and browser installed from the package archive
    pub desktop_packages: Vec<String>,
    /// TurboVNC installation prefix
    pub install_dir: PathBuf,
    pub security_config_path: PathBuf,
    /// Port of display :1, forwarded over SSH
    pub display_port: u16,
    /// Fallback parent of home directories when `getent` is unavailable
    pub home_base: PathBuf,
}

impl Default for VncConfig {
    fn default() -> Self {
        Self {
            libjpeg_turbo_version: "2.0.3".to_string(),
            turbovnc_version: "2.2.3".to_string(),
            download_base: "https://svwh.dl.sourceforge.net/project".to_string(),
            desktop_packages: vec!["lxde".to_string(), "firefox".to_string()],
            install_dir: PathBuf::from("/opt/TurboVNC"),
            security_config_path: PathBuf::from("/etc/turbovncserver-security.conf"),
            display_port: 5901,
            home_base: PathBuf::from("/home"),
        }
    }
}

impl VncConfig {
    /// URL of the libjpeg-turbo package
    pub fn libjpeg_turbo_url(&self) -> String {
        format!(
            "{0}/libjpeg-turbo/{1}/libjpeg-turbo-official_{1}_amd64.deb",
            self.download_base.trim_end_matches('/'),
            self.libjpeg_turbo_version
        )
    }

    /// URL of the TurboVNC package
    pub fn turbovnc_url(&self) -> String {
        format!(
            "{0}/turbovnc/{1}/turbovnc_{1}_amd64.deb",
            self.download_base.trim_end_matches('/'),
            self.turbovnc_version
        )
    }
}

impl AgentConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let user = &self.ssh.user_name;
        if user.is_empty() {
            return Err(RemoteAccessError::validation("SSH user name cannot be empty"));
        }
        if user == "root" {
            return Err(RemoteAccessError::validation(
                "SSH user name must not be root; root gets its own password",
            ));
        }
        let login_re = Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$")
            .map_err(|e| RemoteAccessError::config(format!("Invalid regex pattern: {}", e)))?;
        if !login_re.is_match(user) {
            return Err(RemoteAccessError::ValidationError(format!(
                "Invalid user name: {}",
                user
            )));
        }

        if self.ssh.client_alive_interval == 0 {
            return Err(RemoteAccessError::validation(
                "Client alive interval must be greater than zero",
            ));
        }

        if self.tunnel.local_port == 0 || self.vnc.display_port == 0 {
            return Err(RemoteAccessError::validation("Ports must be non-zero"));
        }

        if self.tunnel.client_download_url.trim().is_empty() {
            return Err(RemoteAccessError::validation(
                "Tunnel client download URL cannot be empty",
            ));
        }

        url::Url::parse(&self.tunnel.status_api_url).map_err(|e| {
            RemoteAccessError::ValidationError(format!(
                "Invalid status API URL {}: {}",
                self.tunnel.status_api_url, e
            ))
        })?;

        if let Some(server) = &self.tunnel.custom_server {
            validate_server_addr(server)?;
        }

        Ok(())
    }
}

/// Check that a relay server address has a `host:port` form
pub fn validate_server_addr(addr: &str) -> Result<()> {
    let valid = match addr.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().map_or(false, |p| p != 0),
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(RemoteAccessError::ValidationError(format!(
            "Custom server must be host:port, got: {}",
            addr
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_parse_is_case_insensitive() {
        assert_eq!("JP".parse::<TunnelRegion>().unwrap(), TunnelRegion::Jp);
        assert_eq!(" in\n".parse::<TunnelRegion>().unwrap(), TunnelRegion::In);
    }

    #[test]
    fn test_region_parse_rejects_unknown() {
        let err = "mars".parse::<TunnelRegion>().unwrap_err();
        assert!(err.to_string().contains("Unknown region: mars"));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = AgentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tunnel.local_port, 22);
        assert_eq!(config.ssh.client_alive_interval, 120);
        assert_eq!(config.ssh.user_name, "colab");
    }

    #[test]
    fn test_root_user_rejected() {
        let mut config = AgentConfig::default();
        config.ssh.user_name = "root".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_user_name_rejected() {
        let mut config = AgentConfig::default();
        config.ssh.user_name = "bad user".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_status_url_rejected() {
        let mut config = AgentConfig::default();
        config.tunnel.status_api_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_server_format() {
        assert!(validate_server_addr("tunnel.example.com:4443").is_ok());
        assert!(validate_server_addr("tunnel.example.com").is_err());
        assert!(validate_server_addr(":4443").is_err());
        assert!(validate_server_addr("host:0").is_err());
    }

    #[test]
    fn test_vnc_urls() {
        let vnc = VncConfig::default();
        assert_eq!(
            vnc.libjpeg_turbo_url(),
            "https://svwh.dl.sourceforge.net/project/libjpeg-turbo/2.0.3/libjpeg-turbo-official_2.0.3_amd64.deb"
        );
        assert_eq!(
            vnc.turbovnc_url(),
            "https://svwh.dl.sourceforge.net/project/turbovnc/2.2.3/turbovnc_2.2.3_amd64.deb"
        );
    }
}
