// file: src/cli/args.rs
// version: 1.0.0
// guid: c23c0af4-35d2-41f5-8771-f97b2c9bf4c4

//! Command line argument definitions

use crate::config::TunnelRegion;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "remote-access-agent")]
#[command(about = "SSH and VNC access to ephemeral notebook containers through a tunnel relay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[arg(
        short,
        long,
        global = true,
        env = "REMOTE_ACCESS_CONFIG",
        help = "YAML config file overriding the built-in defaults"
    )]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up an SSH server reachable through the tunnel relay
    Ssh {
        #[arg(short, long, value_enum, env = "NGROK_REGION", help = "Tunnel relay region")]
        region: Option<RegionArg>,

        #[arg(long, help = "Self-hosted tunnel server (host:port)")]
        custom_server: Option<String>,

        #[arg(long, help = "Ask before continuing on a machine without a GPU")]
        check_gpu: bool,

        #[arg(long, help = "Return once connected and leave the tunnel client running")]
        detach: bool,
    },

    /// Set up SSH, then a VNC desktop reachable through an SSH port forward
    Vnc {
        #[arg(short, long, value_enum, env = "NGROK_REGION", help = "Tunnel relay region")]
        region: Option<RegionArg>,

        #[arg(long, help = "Self-hosted tunnel server (host:port)")]
        custom_server: Option<String>,

        #[arg(long, help = "Return once connected and leave the tunnel client running")]
        detach: bool,
    },

    /// Check system prerequisites
    CheckPrereqs,

    /// List tunnel relay regions
    Regions {
        #[arg(short, long)]
        json: bool,
    },
}

/// Region argument for CLI
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum RegionArg {
    Us,
    Eu,
    Ap,
    Au,
    Sa,
    Jp,
    In,
}

impl From<RegionArg> for TunnelRegion {
    fn from(region: RegionArg) -> Self {
        match region {
            RegionArg::Us => TunnelRegion::Us,
            RegionArg::Eu => TunnelRegion::Eu,
            RegionArg::Ap => TunnelRegion::Ap,
            RegionArg::Au => TunnelRegion::Au,
            RegionArg::Sa => TunnelRegion::Sa,
            RegionArg::Jp => TunnelRegion::Jp,
            RegionArg::In => TunnelRegion::In,
        }
    }
}
