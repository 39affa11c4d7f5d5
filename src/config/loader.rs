// file: src/config/loader.rs
// version: 1.0.0
// guid: 53b22ea5-1895-4acc-8e99-4412bd14ce73

//! Configuration file loading and environment variable substitution

use super::AgentConfig;
use crate::Result;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Load agent configuration from a YAML file
    pub fn load_agent_config<P: AsRef<Path>>(&self, path: P) -> Result<AgentConfig> {
        let content = fs::read_to_string(&path).map_err(|e| {
            crate::error::RemoteAccessError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        self.parse_agent_config(&content)
    }

    /// Parse agent configuration from YAML text
    pub fn parse_agent_config(&self, content: &str) -> Result<AgentConfig> {
        let expanded = self.expand_env_vars(content)?;
        let config: AgentConfig = serde_yaml::from_str(&expanded)?;

        config.validate()?;

        Ok(config)
    }

    /// Expand environment variables in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            crate::error::RemoteAccessError::ConfigError(format!("Invalid regex pattern: {}", e))
        })?;

        let mut result = content.to_string();
        let mut missing_vars = Vec::new();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];

            if let Some(value) = self.env_vars.get(var_name) {
                result = result.replace(placeholder, value);
            } else if !missing_vars.iter().any(|v| v == var_name) {
                missing_vars.push(var_name.to_string());
            }
        }

        if !missing_vars.is_empty() {
            return Err(crate::error::RemoteAccessError::ConfigError(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result)
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TunnelRegion;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_env_var_expansion() {
        let mut loader = ConfigLoader::new();
        loader.set_env_var("TEST_RELAY".to_string(), "relay.test:4443".to_string());

        let result = loader.expand_env_vars("custom_server: ${TEST_RELAY}").unwrap();
        assert_eq!(result, "custom_server: relay.test:4443");
    }

    #[test]
    fn test_missing_env_var() {
        let loader = ConfigLoader::new();

        let result = loader.expand_env_vars("key: ${SURELY_MISSING_REMOTE_ACCESS_VAR}");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Missing environment variables"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
tunnel:
  region: eu
ssh:
  user_name: student
"#
        )
        .unwrap();

        let loader = ConfigLoader::new();
        let config = loader.load_agent_config(file.path())?;

        assert_eq!(config.tunnel.region, Some(TunnelRegion::Eu));
        assert_eq!(config.ssh.user_name, "student");
        assert_eq!(config.ssh.client_alive_interval, 120);
        assert_eq!(config.tunnel.status_api_url, "http://localhost:4040/api/tunnels");
        assert!(!config.check_gpu);

        Ok(())
    }

    #[test]
    fn test_invalid_config_rejected() {
        let loader = ConfigLoader::new();
        let result = loader.parse_agent_config("ssh:\n  user_name: root\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let loader = ConfigLoader::new();
        let err = loader
            .load_agent_config("/nonexistent/remote-access.yaml")
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::RemoteAccessError::ConfigError(_)
        ));
    }
}
