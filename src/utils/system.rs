// file: src/utils/system.rs
// version: 1.0.0
// guid: 2424f6b1-def1-4ce3-86fe-6ef8b72db6fc

//! System utility functions

/// Commands the SSH sequence shells out to
pub const REQUIRED_COMMANDS: &[&str] = &[
    "apt-get",
    "dpkg-query",
    "ssh-keygen",
    "useradd",
    "adduser",
    "chpasswd",
    "service",
    "unminimize",
];

/// System utility functions
pub struct SystemUtils;

impl SystemUtils {
    /// Check if a command exists in PATH
    pub fn command_exists(command: &str) -> bool {
        which::which(command).is_ok()
    }

    /// Check if running as root
    pub fn is_root() -> bool {
        #[cfg(unix)]
        {
            unsafe { libc::getuid() == 0 }
        }
        #[cfg(not(unix))]
        {
            false
        }
    }

    /// Commands from `commands` missing from PATH
    pub fn missing_commands(commands: &[&str]) -> Vec<String> {
        commands
            .iter()
            .filter(|cmd| !Self::command_exists(cmd))
            .map(|cmd| cmd.to_string())
            .collect()
    }
}
