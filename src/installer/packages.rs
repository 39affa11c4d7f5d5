// file: src/installer/packages.rs
// version: 1.0.0
// guid: e2a43f69-393d-44ae-ab12-ce8f8d4002ec

//! Package management through apt

use crate::error::RemoteAccessError;
use crate::executor::CommandExecutor;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct PackageManager<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> PackageManager<'a> {
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }

    /// Refresh the package cache
    pub async fn update_cache(&self) -> Result<()> {
        info!("Updating package cache");
        self.executor.run("apt-get", &["update"]).await
    }

    /// Upgrade every installed package
    pub async fn upgrade(&self) -> Result<()> {
        info!("Upgrading installed packages");
        self.executor
            .run(
                "apt-get",
                &[
                    "-y",
                    "-o",
                    "Dpkg::Options::=--force-confdef",
                    "-o",
                    "Dpkg::Options::=--force-confold",
                    "upgrade",
                ],
            )
            .await
    }

    /// Restore the content stripped from a minimal image
    pub async fn unminimize(&self) -> Result<()> {
        info!("Restoring packages removed from the minimal image");
        self.executor.run_with_input("unminimize", &[], "y\n").await
    }

    /// Check whether a package is installed
    pub async fn is_installed(&self, name: &str) -> Result<bool> {
        match self
            .executor
            .output("dpkg-query", &["-W", "-f=${Status}", name])
            .await
        {
            Ok(status) => Ok(status.trim() == "install ok installed"),
            // dpkg-query exits non-zero for packages it has never seen
            Err(RemoteAccessError::ProcessError { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Install packages that are not installed yet, returning the ones installed
    pub async fn install(&self, names: &[&str]) -> Result<Vec<String>> {
        let mut marked = Vec::new();

        for name in names {
            if self.is_installed(name).await? {
                println!("{} is already installed", name);
            } else {
                println!("Install {}", name);
                marked.push(name.to_string());
            }
        }

        if marked.is_empty() {
            return Ok(marked);
        }

        let mut args = vec!["install", "-y"];
        args.extend(marked.iter().map(String::as_str));
        self.executor
            .run("apt-get", &args)
            .await
            .map_err(|e| {
                RemoteAccessError::PackageError(format!(
                    "Failed to install {}: {}",
                    marked.join(", "),
                    e
                ))
            })?;

        info!("Installed packages: {}", marked.join(", "));
        Ok(marked)
    }

    /// Install local `.deb` files together with their dependencies
    pub async fn install_deb_files(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let rendered: Vec<String> = paths.iter().map(|p| local_package_arg(p)).collect();
        let mut args = vec!["install", "-y"];
        args.extend(rendered.iter().map(String::as_str));

        info!("Installing local packages: {}", rendered.join(", "));
        self.executor.run("apt-get", &args).await
    }
}

/// apt treats an argument as a file only when it contains a slash
fn local_package_arg(path: &Path) -> String {
    let rendered = path.to_string_lossy().to_string();
    if rendered.contains('/') {
        rendered
    } else {
        format!("./{}", rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::recording::RecordingExecutor;

    #[tokio::test]
    async fn test_install_skips_installed_packages() {
        // Arrange
        let executor = RecordingExecutor::new()
            .respond("dpkg-query -W -f=${Status} lxde", 0, "install ok installed");
        let packages = PackageManager::new(&executor);

        // Act
        let installed = packages.install(&["lxde", "firefox"]).await.unwrap();

        // Assert
        assert_eq!(installed, vec!["firefox"]);
        assert_eq!(
            executor.lines().last().unwrap(),
            "apt-get install -y firefox"
        );
    }

    #[tokio::test]
    async fn test_install_nothing_when_all_present() {
        let executor = RecordingExecutor::new()
            .respond("dpkg-query", 0, "install ok installed");
        let packages = PackageManager::new(&executor);

        let installed = packages.install(&["openssh-server"]).await.unwrap();

        assert!(installed.is_empty());
        assert!(!executor.lines().iter().any(|l| l.starts_with("apt-get")));
    }

    #[tokio::test]
    async fn test_unknown_package_counts_as_missing() {
        let executor = RecordingExecutor::new().respond("dpkg-query", 1, "");
        let packages = PackageManager::new(&executor);

        assert!(!packages.is_installed("openssh-server").await.unwrap());
    }

    #[tokio::test]
    async fn test_install_failure_is_package_error() {
        let executor = RecordingExecutor::new()
            .respond("dpkg-query", 1, "")
            .respond("apt-get install", 100, "");
        let packages = PackageManager::new(&executor);

        let err = packages.install(&["openssh-server"]).await.unwrap_err();

        assert!(matches!(err, RemoteAccessError::PackageError(_)));
    }

    #[tokio::test]
    async fn test_unminimize_answers_yes() {
        let executor = RecordingExecutor::new();
        let packages = PackageManager::new(&executor);

        packages.unminimize().await.unwrap();

        let calls = executor.calls();
        assert_eq!(calls[0].line, "unminimize");
        assert_eq!(calls[0].input.as_deref(), Some("y\n"));
    }

    #[tokio::test]
    async fn test_install_deb_files_uses_paths() {
        let executor = RecordingExecutor::new();
        let packages = PackageManager::new(&executor);

        packages
            .install_deb_files(&[PathBuf::from("turbovnc.deb"), PathBuf::from("/tmp/x.deb")])
            .await
            .unwrap();

        assert_eq!(
            executor.lines(),
            vec!["apt-get install -y ./turbovnc.deb /tmp/x.deb"]
        );
    }
}
