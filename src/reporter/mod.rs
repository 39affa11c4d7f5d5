// file: src/reporter/mod.rs
// version: 1.0.0
// guid: 27a11639-d394-41b6-8ae8-d686b048aba1

//! Console report for the person at the notebook
//!
//! Everything here returns plain text; callers print it to stdout so it stays
//! separate from the tracing output on stderr.

use crate::config::TunnelRegion;
use crate::credentials::{Credentials, VncCredentials};
use crate::tunnel::TunnelEndpoint;

/// Options added to every suggested ssh command
pub const SSH_COMMON_OPTIONS: &str = "-o UserKnownHostsFile=/dev/null -o VisualHostKey=yes";

/// Cut-here line framing anything meant to be copied
pub fn scissors() -> String {
    "✂️".repeat(24)
}

fn framed(body: &str) -> String {
    let line = scissors();
    format!("{line}\n{body}\n{line}")
}

/// Root and user passwords
pub fn credentials_block(credentials: &Credentials) -> String {
    framed(&format!(
        "root password: {}\n{} password: {}",
        credentials.root_password, credentials.user_name, credentials.user_password
    ))
}

/// ssh command reaching the tunnel endpoint
pub fn ssh_command(endpoint: &TunnelEndpoint, user: &str) -> String {
    format!(
        "ssh {} -p {} {}@{}",
        SSH_COMMON_OPTIONS, endpoint.port, user, endpoint.host
    )
}

/// ssh command that also forwards the VNC display port
pub fn vnc_forward_command(endpoint: &TunnelEndpoint, user: &str, vnc_port: u16) -> String {
    format!(
        "ssh {} -L {vnc_port}:localhost:{vnc_port} -p {} {}@{}",
        SSH_COMMON_OPTIONS, endpoint.port, user, endpoint.host
    )
}

/// Connection instructions printed once the tunnel is up
pub fn connection_block(endpoint: &TunnelEndpoint, user: &str, vnc_port: u16) -> String {
    [
        "---".to_string(),
        "Command to connect to the ssh server:".to_string(),
        framed(&ssh_command(endpoint, user)),
        "---".to_string(),
        "If you use VNC:".to_string(),
        framed(&vnc_forward_command(endpoint, user, vnc_port)),
    ]
    .join("\n")
}

/// VNC passwords
pub fn vnc_credentials_block(credentials: &VncCredentials) -> String {
    framed(&format!(
        "VNC password: {}\nVNC view only password: {}",
        credentials.password, credentials.view_only_password
    ))
}

/// Where to get the authtoken
pub fn authtoken_instructions() -> String {
    [
        "---",
        "Copy&paste your tunnel authtoken from https://dashboard.ngrok.com/auth",
        "(You need to sign up for ngrok and login,)",
    ]
    .join("\n")
}

/// Region selection menu
pub fn region_menu() -> String {
    let mut lines = vec!["Select your ngrok region:".to_string()];
    lines.extend(
        TunnelRegion::all()
            .iter()
            .map(|r| format!("{} - {}", r.as_str(), r.description())),
    );
    lines.join("\n")
}

/// Warning shown before asking whether to continue without a GPU
pub fn gpu_warning() -> String {
    [
        "Warning! GPU of your assigned virtual machine is not available.",
        "You might have used up the GPU quota, or no GPU runtime was selected.",
    ]
    .join("\n")
}
