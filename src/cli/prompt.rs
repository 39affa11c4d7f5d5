// file: src/cli/prompt.rs
// version: 1.0.0
// guid: 8046338a-572c-43b8-8f8e-ee47b62c078a

//! Interactive questions asked on the console

use crate::config::TunnelRegion;
use crate::error::RemoteAccessError;
use crate::reporter;
use crate::Result;
use std::io::{self, Write};
use tracing::debug;

/// Questions the setup commands ask the user
pub trait Prompter {
    /// Relay authtoken
    fn authtoken(&self) -> Result<String>;

    /// Region picked from the menu, `None` to let the relay decide
    fn region(&self) -> Result<Option<TunnelRegion>>;

    /// Yes/no answer to `question`
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Asks on the controlling terminal
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn authtoken(&self) -> Result<String> {
        read_authtoken()
    }

    fn region(&self) -> Result<Option<TunnelRegion>> {
        read_region()
    }

    fn confirm(&self, question: &str) -> Result<bool> {
        confirm(question)
    }
}

/// Environment variable consulted before prompting for the authtoken
pub const AUTHTOKEN_ENV: &str = "NGROK_AUTHTOKEN";

/// Read the relay authtoken from the environment or without echo from the tty
pub fn read_authtoken() -> Result<String> {
    if let Ok(token) = std::env::var(AUTHTOKEN_ENV) {
        if !token.trim().is_empty() {
            debug!("Using authtoken from {}", AUTHTOKEN_ENV);
            return normalize_authtoken(&token);
        }
    }

    println!("{}", reporter::authtoken_instructions());
    let token = rpassword::prompt_password("Authtoken: ")?;
    normalize_authtoken(&token)
}

pub fn normalize_authtoken(raw: &str) -> Result<String> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(RemoteAccessError::validation("Authtoken cannot be empty"));
    }
    Ok(token.to_string())
}

/// Show the region menu and read the answer
pub fn read_region() -> Result<Option<TunnelRegion>> {
    println!("{}", reporter::region_menu());
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    parse_region_answer(&line)
}

/// Empty answer means "let the relay decide"
pub fn parse_region_answer(answer: &str) -> Result<Option<TunnelRegion>> {
    if answer.trim().is_empty() {
        Ok(None)
    } else {
        answer.parse().map(Some)
    }
}

/// Ask a yes/no question
pub fn confirm(question: &str) -> Result<bool> {
    print!("{} ", question);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(is_yes(&line))
}

pub fn is_yes(answer: &str) -> bool {
    answer.trim().to_ascii_lowercase().starts_with('y')
}
