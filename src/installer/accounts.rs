// file: src/installer/accounts.rs
// version: 1.0.0
// guid: fe4cd113-3d30-41ad-9a5d-fc081e5b42d6

//! Login accounts and passwords

use crate::executor::CommandExecutor;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct AccountManager<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> AccountManager<'a> {
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }

    /// Create a user with a home directory
    ///
    /// Failure is tolerated: the user survives from an earlier run in the
    /// same container.
    pub async fn create_user(&self, name: &str, shell: &str) -> Result<()> {
        info!("Creating user {}", name);
        let code = self
            .executor
            .run_unchecked("useradd", &["-s", shell, "-m", name])
            .await?;
        if code != 0 {
            warn!("useradd {} exited with code {} (user may already exist)", name, code);
        }
        Ok(())
    }

    /// Add the user to the sudo group
    pub async fn grant_sudo(&self, name: &str, group: &str) -> Result<()> {
        self.executor.run("adduser", &[name, group]).await
    }

    /// Set a password through `chpasswd`
    pub async fn set_password(&self, name: &str, password: &str) -> Result<()> {
        let code = self
            .executor
            .run_with_input_unchecked("chpasswd", &[], &format!("{}:{}", name, password))
            .await?;
        if code != 0 {
            warn!("chpasswd for {} exited with code {}", name, code);
        }
        Ok(())
    }

    /// Home directory from the passwd database, or `<home_base>/<name>`
    pub async fn home_dir(&self, name: &str, home_base: &Path) -> PathBuf {
        match self.executor.output("getent", &["passwd", name]).await {
            Ok(entry) => parse_passwd_home(&entry).unwrap_or_else(|| home_base.join(name)),
            Err(_) => home_base.join(name),
        }
    }
}

/// Sixth field of a passwd line
fn parse_passwd_home(entry: &str) -> Option<PathBuf> {
    entry
        .lines()
        .next()?
        .split(':')
        .nth(5)
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::recording::RecordingExecutor;

    #[test]
    fn test_parse_passwd_home() {
        let home = parse_passwd_home("colab:x:1000:1000::/home/colab:/bin/bash\n");
        assert_eq!(home, Some(PathBuf::from("/home/colab")));
        assert_eq!(parse_passwd_home("garbage"), None);
    }

    #[tokio::test]
    async fn test_create_user_tolerates_existing_user() {
        let executor = RecordingExecutor::new().respond("useradd", 9, "");
        let accounts = AccountManager::new(&executor);

        accounts.create_user("colab", "/bin/bash").await.unwrap();

        assert_eq!(executor.lines(), vec!["useradd -s /bin/bash -m colab"]);
    }

    #[tokio::test]
    async fn test_grant_sudo_is_checked() {
        let executor = RecordingExecutor::new().respond("adduser", 1, "");
        let accounts = AccountManager::new(&executor);

        assert!(accounts.grant_sudo("colab", "sudo").await.is_err());
    }

    #[tokio::test]
    async fn test_set_password_uses_stdin() {
        let executor = RecordingExecutor::new();
        let accounts = AccountManager::new(&executor);

        accounts.set_password("root", "s3cret").await.unwrap();

        let call = &executor.calls()[0];
        assert_eq!(call.line, "chpasswd");
        assert_eq!(call.input.as_deref(), Some("root:s3cret"));
    }

    #[tokio::test]
    async fn test_home_dir_falls_back() {
        let executor = RecordingExecutor::new().respond("getent", 2, "");
        let accounts = AccountManager::new(&executor);

        let home = accounts.home_dir("colab", Path::new("/home")).await;

        assert_eq!(home, PathBuf::from("/home/colab"));
    }
}
