// file: src/installer/mod.rs
// version: 1.0.0
// guid: cd684e50-faae-409c-bc7d-b869ac8709bc

//! Provisioning of SSH and VNC access on the local machine

pub mod accounts;
pub mod gpu;
pub mod packages;
pub mod ssh;
pub mod sshd;
pub mod vnc;

pub use accounts::AccountManager;
pub use gpu::gpu_available;
pub use packages::PackageManager;
pub use ssh::{SshProvisioner, SshSession, TunnelRequest};
pub use sshd::SshdConfigurator;
pub use vnc::VncProvisioner;
