// file: src/tunnel/api.rs
// version: 1.0.0
// guid: d1c2ef5a-6e65-4d67-9e83-4a7fc90291f8

//! Client for the tunnel client's local status API

use super::TunnelEndpoint;
use crate::error::RemoteAccessError;
use crate::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Body of `GET /api/tunnels`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelsResponse {
    #[serde(default)]
    pub tunnels: Vec<TunnelInfo>,
}

/// One active tunnel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelInfo {
    pub public_url: String,
    #[serde(default)]
    pub proto: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Split a `tcp://host:port` public URL
pub fn parse_public_url(url: &str) -> Result<TunnelEndpoint> {
    let re = Regex::new(r"^tcp://(.+):(\d+)$")
        .map_err(|e| RemoteAccessError::config(format!("Invalid regex pattern: {}", e)))?;

    let caps = re.captures(url.trim()).ok_or_else(|| {
        RemoteAccessError::TunnelError(format!("Unexpected tunnel public URL: {}", url))
    })?;

    let port = caps[2].parse::<u16>().map_err(|_| {
        RemoteAccessError::TunnelError(format!("Tunnel port out of range in: {}", url))
    })?;

    Ok(TunnelEndpoint {
        host: caps[1].to_string(),
        port,
    })
}

/// Status API of a running tunnel client
pub struct StatusApi {
    client: reqwest::Client,
    url: String,
}

impl StatusApi {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// List active tunnels
    pub async fn tunnels(&self) -> Result<TunnelsResponse> {
        debug!("Querying tunnel status API: {}", self.url);

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            RemoteAccessError::NetworkError(format!(
                "Tunnel status API at {} unreachable: {}",
                self.url, e
            ))
        })?;

        if !response.status().is_success() {
            return Err(RemoteAccessError::NetworkError(format!(
                "Tunnel status API returned {}",
                response.status()
            )));
        }

        Ok(response.json::<TunnelsResponse>().await?)
    }

    /// Public endpoint of the first tunnel
    pub async fn fetch_endpoint(&self) -> Result<TunnelEndpoint> {
        let status = self.tunnels().await?;
        let first = status
            .tunnels
            .first()
            .ok_or_else(|| RemoteAccessError::tunnel("Tunnel client reports no active tunnels"))?;

        let endpoint = parse_public_url(&first.public_url)?;
        info!("Tunnel endpoint: {}", endpoint);
        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_public_url() {
        let endpoint = parse_public_url("tcp://0.tcp.jp.ngrok.io:17421").unwrap();
        assert_eq!(endpoint.host, "0.tcp.jp.ngrok.io");
        assert_eq!(endpoint.port, 17421);
    }

    #[test]
    fn test_parse_public_url_rejects_https() {
        let err = parse_public_url("https://abcd.ngrok.io").unwrap_err();
        assert!(matches!(err, RemoteAccessError::TunnelError(_)));
    }

    #[test]
    fn test_parse_public_url_rejects_huge_port() {
        assert!(parse_public_url("tcp://host:99999").is_err());
    }

    #[tokio::test]
    async fn test_fetch_endpoint_takes_first_tunnel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tunnels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tunnels": [
                    {"name": "command_line", "proto": "tcp", "public_url": "tcp://2.tcp.ngrok.io:10022"},
                    {"name": "other", "proto": "tcp", "public_url": "tcp://3.tcp.ngrok.io:1"}
                ],
                "uri": "/api/tunnels"
            })))
            .mount(&server)
            .await;

        let api = StatusApi::new(format!("{}/api/tunnels", server.uri()));
        let endpoint = api.fetch_endpoint().await.unwrap();

        assert_eq!(
            endpoint,
            TunnelEndpoint {
                host: "2.tcp.ngrok.io".to_string(),
                port: 10022
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_endpoint_without_tunnels() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tunnels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tunnels": []
            })))
            .mount(&server)
            .await;

        let api = StatusApi::new(format!("{}/api/tunnels", server.uri()));
        let err = api.fetch_endpoint().await.unwrap_err();

        assert!(matches!(err, RemoteAccessError::TunnelError(_)));
    }
}
