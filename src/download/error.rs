use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    // Covers errors while streaming the response body
    #[error("Download of {0} was interrupted")]
    Stream(String, #[source] reqwest::Error),

    #[error("Failed to create download directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Download path exists but is not a directory: '{0}'")]
    NotADirectory(PathBuf),

    #[error("Failed to read download directory '{0}'")]
    DirRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write file '{0}'")]
    FileWrite(PathBuf, #[source] std::io::Error),
}

impl DownloadError {
    pub(crate) fn from_request(url: &str, e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => DownloadError::HttpStatus {
                url: url.to_string(),
                status,
                source: e,
            },
            None => DownloadError::NetworkRequest(url.to_string(), e),
        }
    }

    /// Whether this is a local filesystem failure rather than a network one.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            DownloadError::DirCreation(..)
                | DownloadError::NotADirectory(_)
                | DownloadError::DirRead(..)
                | DownloadError::FileWrite(..)
        )
    }
}
