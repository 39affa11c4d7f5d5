// file: src/credentials.rs
// version: 1.0.0
// guid: b26b1554-6eaa-43e8-94e0-1d5613bda703

//! Generated login secrets
//!
//! Secrets are regenerated on every run and only ever shown on the console.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

/// Random bytes behind each token
const TOKEN_BYTES: usize = 32;

/// VNC authentication only looks at the first eight characters
pub const VNC_PASSWORD_LEN: usize = 8;

/// Generate a URL-safe random token (43 characters)
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a VNC password
pub fn generate_vnc_password() -> String {
    generate_token().chars().take(VNC_PASSWORD_LEN).collect()
}

/// Passwords for the SSH session
#[derive(Clone)]
pub struct Credentials {
    pub root_password: String,
    pub user_name: String,
    pub user_password: String,
}

impl Credentials {
    /// Generate fresh root and user passwords
    pub fn generate(user_name: &str) -> Self {
        Self {
            root_password: generate_token(),
            user_name: user_name.to_string(),
            user_password: generate_token(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("root_password", &"********")
            .field("user_name", &self.user_name)
            .field("user_password", &"********")
            .finish()
    }
}

/// Passwords for the VNC server
#[derive(Clone)]
pub struct VncCredentials {
    pub password: String,
    pub view_only_password: String,
}

impl VncCredentials {
    pub fn generate() -> Self {
        Self {
            password: generate_vnc_password(),
            view_only_password: generate_vnc_password(),
        }
    }

    /// Input for `vncpasswd -f`: full-access password, then view-only password
    pub fn vncpasswd_input(&self) -> String {
        format!("{}\n{}", self.password, self.view_only_password)
    }
}

impl std::fmt::Debug for VncCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VncCredentials")
            .field("password", &"********")
            .field("view_only_password", &"********")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_url_safe() {
        let token = generate_token();

        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_tokens_differ() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_vnc_password_length() {
        assert_eq!(generate_vnc_password().len(), VNC_PASSWORD_LEN);
    }

    #[test]
    fn test_credentials_debug_masks_secrets() {
        let creds = Credentials::generate("colab");

        let shown = format!("{:?}", creds);

        assert!(shown.contains("colab"));
        assert!(!shown.contains(&creds.root_password));
        assert!(!shown.contains(&creds.user_password));
    }

    #[test]
    fn test_vncpasswd_input() {
        let creds = VncCredentials {
            password: "abcdefgh".to_string(),
            view_only_password: "12345678".to_string(),
        };
        assert_eq!(creds.vncpasswd_input(), "abcdefgh\n12345678");
    }
}
