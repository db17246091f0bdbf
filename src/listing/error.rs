use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read listing page body from {0}")]
    BodyRead(String, #[source] reqwest::Error),
}

impl ListingError {
    pub(crate) fn from_request(url: &str, e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ListingError::HttpStatus {
                url: url.to_string(),
                status,
                source: e,
            },
            None => ListingError::NetworkRequest(url.to_string(), e),
        }
    }
}
