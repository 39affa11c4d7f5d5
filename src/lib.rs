// file: src/lib.rs
// version: 1.0.0
// guid: e0028d28-4500-41af-9ba7-96177ace0e60

//! # Remote Access Agent
//!
//! Turns a throwaway notebook container into an SSH (and optionally VNC)
//! host reachable from anywhere, by installing OpenSSH, creating a login
//! account with fresh passwords and exposing port 22 through an ngrok TCP
//! tunnel.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod installer;
pub mod logging;
pub mod network;
pub mod reporter;
pub mod tunnel;
pub mod utils;

pub use error::{RemoteAccessError, Result};

/// Version information for the agent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
