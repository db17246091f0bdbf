use crate::download::error::DownloadError;
use log::{info, warn};
use reqwest::{Client, Response};
use std::io;
use std::path::Path;

/// Sends a GET to `url`, turning non-2xx responses into errors carrying their status.
pub async fn send_checked(client: &Client, url: &str) -> Result<Response, reqwest::Error> {
    let response = client.get(url).send().await?;
    response.error_for_status().inspect_err(|e| {
        warn!("HTTP error for {}: {:?}", url, e);
    })
}

pub async fn ensure_dir_exists(path: &Path) -> Result<(), DownloadError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(DownloadError::NotADirectory(path.to_path_buf()));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating download directory: {}", path.display());
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| DownloadError::DirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(DownloadError::DirCreation(path.to_path_buf(), e)),
    }
}

/// Whether `dir` has an entry named exactly `file_name`.
pub async fn dir_contains(dir: &Path, file_name: &str) -> Result<bool, DownloadError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| DownloadError::DirRead(dir.to_path_buf(), e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DownloadError::DirRead(dir.to_path_buf(), e))?
    {
        if entry.file_name() == file_name {
            return Ok(true);
        }
    }
    Ok(false)
}
