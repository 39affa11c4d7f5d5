// file: src/installer/vnc.rs
// version: 1.0.0
// guid: 3a6ff943-91b4-40cf-a9ef-f5adfbc752bf

//! TurboVNC desktop for the session user

use super::{AccountManager, PackageManager};
use crate::config::VncConfig;
use crate::credentials::VncCredentials;
use crate::executor::CommandExecutor;
use crate::logging::logger::with_async_operation_span;
use crate::network::NetworkDownloader;
use crate::reporter;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Server-side restrictions: only connections tunnelled over SSH are served
pub const SECURITY_CONFIG: &str = "no-remote-connections\nno-httpd\nno-x11-tcp-connections\n";

pub struct VncProvisioner<'a> {
    executor: &'a dyn CommandExecutor,
    config: &'a VncConfig,
    work_dir: &'a Path,
    downloader: NetworkDownloader,
}

impl<'a> VncProvisioner<'a> {
    pub fn new(executor: &'a dyn CommandExecutor, config: &'a VncConfig, work_dir: &'a Path) -> Self {
        Self {
            executor,
            config,
            work_dir,
            downloader: NetworkDownloader::new(),
        }
    }

    /// Install the desktop and start a VNC server as `user`
    pub async fn run(&self, user: &str) -> Result<VncCredentials> {
        info!("Provisioning VNC desktop for {}", user);

        let debs = self.download_packages().await?;

        let packages = &PackageManager::new(self.executor);
        let desktop: Vec<&str> = self.config.desktop_packages.iter().map(String::as_str).collect();
        let debs_ref = &debs;
        let desktop_ref = &desktop;
        with_async_operation_span("install_desktop", || async move {
            packages.install_deb_files(debs_ref).await?;
            packages.install(desktop_ref).await
        })
        .await?;

        tokio::fs::write(&self.config.security_config_path, SECURITY_CONFIG).await?;

        let credentials = VncCredentials::generate();
        println!("{}", reporter::vnc_credentials_block(&credentials));

        let accounts = AccountManager::new(self.executor);
        let home = accounts.home_dir(user, &self.config.home_base).await;
        self.write_user_files(user, &home, &credentials).await?;

        let vncserver = self.config.install_dir.join("bin/vncserver");
        let vncserver = vncserver.to_string_lossy();
        let output = self
            .executor
            .output("su", &["-c", vncserver.as_ref(), user])
            .await?;
        println!("{}", output);

        info!("VNC server started for {}", user);
        Ok(credentials)
    }

    async fn download_packages(&self) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(self.work_dir).await?;

        let libjpeg = self.work_dir.join("libjpeg-turbo.deb");
        let turbovnc = self.work_dir.join("turbovnc.deb");
        self.downloader
            .download_with_progress(&self.config.libjpeg_turbo_url(), &libjpeg)
            .await?;
        self.downloader
            .download_with_progress(&self.config.turbovnc_url(), &turbovnc)
            .await?;

        Ok(vec![libjpeg, turbovnc])
    }

    /// Password file and screensaver settings in the user's home
    async fn write_user_files(
        &self,
        user: &str,
        home: &Path,
        credentials: &VncCredentials,
    ) -> Result<()> {
        let vnc_dir = home.join(".vnc");
        tokio::fs::create_dir_all(&vnc_dir).await?;

        let vncpasswd = self.config.install_dir.join("bin/vncpasswd");
        let encoded = self
            .executor
            .output_with_input(
                &vncpasswd.to_string_lossy(),
                &["-f"],
                &credentials.vncpasswd_input(),
            )
            .await?;

        let passwd = vnc_dir.join("passwd");
        tokio::fs::write(&passwd, encoded).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&passwd, std::fs::Permissions::from_mode(0o600)).await?;
        }

        // No one wants a screensaver over VNC
        let xscreensaver = home.join(".xscreensaver");
        tokio::fs::write(&xscreensaver, "mode: off\n").await?;

        let owner = format!("{}:", user);
        let vnc_dir = vnc_dir.to_string_lossy();
        let xscreensaver = xscreensaver.to_string_lossy();
        self.executor
            .run("chown", &["-R", owner.as_str(), vnc_dir.as_ref()])
            .await?;
        self.executor
            .run("chown", &[owner.as_str(), xscreensaver.as_ref()])
            .await?;
        Ok(())
    }
}
