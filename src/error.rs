use crate::download::error::DownloadError;
use crate::listing::error::ListingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClimatePdfsError {
    #[error(transparent)]
    Listing(#[from] ListingError),

    #[error(transparent)]
    Download(#[from] DownloadError),
}
