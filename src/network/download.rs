// file: src/network/download.rs
// version: 1.0.0
// guid: 52a18e52-a8a2-4de2-b084-37a7c2813d26

//! Network download and archive utilities

use crate::error::RemoteAccessError;
use crate::Result;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

/// Network downloader with progress tracking
pub struct NetworkDownloader {
    client: reqwest::Client,
}

impl NetworkDownloader {
    /// Create a new network downloader
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Download file with progress bar, returning its SHA-256
    pub async fn download_with_progress<P: AsRef<Path>>(&self, url: &str, dest: P) -> Result<String> {
        match self.fetch_to_file(url, dest.as_ref()).await {
            Ok(digest) => Ok(digest),
            Err(e) => {
                error!("Failed to download {}", url);
                Err(e)
            }
        }
    }

    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<String> {
        info!("Downloading: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(RemoteAccessError::NetworkError(format!(
                "Download of {} failed with status: {}",
                url,
                response.status()
            )));
        }

        let total_size = response.content_length().unwrap_or(0);

        let pb = ProgressBar::new(total_size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .map_err(|e| RemoteAccessError::system(format!("Invalid progress template: {}", e)))?
                .progress_chars("#>-"),
        );

        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut hasher = Sha256::new();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }

        file.flush().await?;
        pb.finish_and_clear();

        let digest = hex::encode(hasher.finalize());
        info!("Downloaded to: {} ({} bytes)", dest.display(), downloaded);
        debug!("SHA-256 of {}: {}", dest.display(), digest);
        Ok(digest)
    }
}

impl Default for NetworkDownloader {
    fn default() -> Self {
        Self::new()
    }
}

/// Unpack a zip archive into `dest_dir`, returning the extracted file paths
///
/// Entries whose path would land outside `dest_dir` are rejected.
pub fn extract_zip(archive: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    debug!("Extracting {} into {}", archive.display(), dest_dir.display());

    let file = fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(io::BufReader::new(file))?;
    let mut extracted = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let relative = entry.enclosed_name().ok_or_else(|| {
            RemoteAccessError::ValidationError(format!(
                "Archive entry escapes destination: {}",
                entry.name()
            ))
        })?;
        let target = dest_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)?;
        io::copy(&mut entry, &mut out)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o7777))?;
        }

        extracted.push(target);
    }

    info!("Extracted {} file(s) from {}", extracted.len(), archive.display());
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, data) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[tokio::test]
    async fn test_download_writes_file_and_hash() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ngrok.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"abc".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("ngrok.zip");
        let downloader = NetworkDownloader::new();

        let digest = downloader
            .download_with_progress(&format!("{}/ngrok.zip", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_download_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let downloader = NetworkDownloader::new();

        let err = downloader
            .download_with_progress(&format!("{}/missing.deb", server.uri()), dir.path().join("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, RemoteAccessError::NetworkError(_)));
    }

    #[test]
    fn test_extract_zip() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("client.zip");
        write_zip(&archive, &[("ngrok", b"#!/bin/sh\n"), ("docs/README", b"hi")]);

        let out = dir.path().join("out");
        let files = extract_zip(&archive, &out).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(fs::read(out.join("ngrok")).unwrap(), b"#!/bin/sh\n");
        assert_eq!(fs::read(out.join("docs/README")).unwrap(), b"hi");
    }

    #[test]
    fn test_extract_zip_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(&archive, &[("../escaped", b"x")]);

        let err = extract_zip(&archive, &dir.path().join("out")).unwrap_err();

        assert!(matches!(err, RemoteAccessError::ValidationError(_)));
        assert!(!dir.path().join("escaped").exists());
    }
}
