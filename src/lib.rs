mod climate_pdfs;
mod download;
mod error;
mod listing;
mod types;
mod utils;

pub use climate_pdfs::*;
pub use error::ClimatePdfsError;

pub use types::download_target::{DownloadTarget, UNKNOWN_YEAR};

pub use download::error::DownloadError;
pub use listing::error::ListingError;
