// file: src/tunnel/mod.rs
// version: 1.0.0
// guid: 55772e37-a996-4ec1-9ff1-e620f43ab2dc

//! Tunnel relay client and its local status API

pub mod api;
pub mod client;

pub use api::{parse_public_url, StatusApi, TunnelInfo, TunnelsResponse};
pub use client::TunnelClient;

use serde::{Deserialize, Serialize};

/// Publicly reachable address of a TCP tunnel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelEndpoint {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for TunnelEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
