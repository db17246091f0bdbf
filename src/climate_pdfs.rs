//! This module provides the main entry point for locating and downloading climate-data PDFs.
//! It lists the subdirectories of the repository index, lists the PDFs inside one of them,
//! and downloads PDFs into a year-partitioned local directory tree.

use crate::download::downloader::PdfDownloader;
use crate::error::ClimatePdfsError;
use crate::listing::{directories, pdfs};
use crate::types::download_target::DownloadTarget;
use bon::bon;
use reqwest::Client;
use std::path::PathBuf;

/// Root listing page of PAGASA's Climatology and Agrometeorology Division file repository.
pub const DEFAULT_INDEX_URL: &str = "https://pubfiles.pagasa.dost.gov.ph/pagasaweb/files/cad/";

/// Base directory downloads are written below when no directory is given.
pub const DEFAULT_DOWNLOAD_DIR: &str = "data-raw";

/// The main client struct for listing and downloading climate-data PDFs.
///
/// A `ClimatePdfs` owns one HTTP client (reused for every request) and the
/// index URL that [`ClimatePdfs::list_directories`] starts from. Nothing else
/// is kept between calls: the only lasting state is the files written by the
/// download operations.
///
/// Create an instance using [`ClimatePdfs::new()`] for the default repository or
/// [`ClimatePdfs::with_index_url()`] to point at another listing.
///
/// # Examples
///
/// ```no_run
/// # use climate_pdfs::{ClimatePdfs, ClimatePdfsError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), ClimatePdfsError> {
/// let client = ClimatePdfs::new();
///
/// let directories = client.list_directories().call().await?;
/// if let Some(directory_url) = directories.first() {
///     let pdf_urls = client.list_pdfs().directory_url(directory_url).call().await?;
///     let paths = client.download_pdfs().urls(&pdf_urls).call().await?;
///     println!("Downloaded {} files", paths.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct ClimatePdfs {
    client: Client,
    index_url: String,
    downloader: PdfDownloader,
}

impl Default for ClimatePdfs {
    fn default() -> Self {
        Self::new()
    }
}

#[bon]
impl ClimatePdfs {
    /// Creates a client for the default repository index, [`DEFAULT_INDEX_URL`].
    pub fn new() -> Self {
        Self::with_index_url(DEFAULT_INDEX_URL)
    }

    /// Creates a client whose directory listings start from `index_url`.
    ///
    /// The URL is concatenated with link labels as-is, so it should end with `/`.
    pub fn with_index_url(index_url: impl Into<String>) -> Self {
        let client = Client::new();
        Self {
            downloader: PdfDownloader::new(client.clone()),
            client,
            index_url: index_url.into(),
        }
    }

    /// The index URL used when [`ClimatePdfs::list_directories`] gets no override.
    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// Lists the climate-data subdirectories of the repository index.
    ///
    /// Every hyperlink inside the index's preformatted listing is considered,
    /// except the parent-directory entry (`../`) and entries whose text contains
    /// `Bulletin`. Each remaining label is appended to the index URL and every
    /// space in the result is replaced by `%20`.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.index_url(&str)`: Optional. Overrides the client's index URL for this call.
    ///
    /// # Returns
    ///
    /// The directory URLs, in the order their links appear on the page.
    ///
    /// # Errors
    ///
    /// Returns [`ClimatePdfsError::Listing`] if the page cannot be fetched or read.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use climate_pdfs::{ClimatePdfs, ClimatePdfsError};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), ClimatePdfsError> {
    /// let client = ClimatePdfs::new();
    /// for directory_url in client.list_directories().call().await? {
    ///     println!("{}", directory_url);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn list_directories(
        &self,
        index_url: Option<&str>,
    ) -> Result<Vec<String>, ClimatePdfsError> {
        let index_url = index_url.unwrap_or(&self.index_url);
        Ok(directories::list_directories(&self.client, index_url).await?)
    }

    /// Lists the PDFs linked from one directory page.
    ///
    /// Every `href` in the page's preformatted listing that contains `pdf`
    /// (case-sensitive, anywhere in the value) is appended to `directory_url`.
    /// The directory URL is used exactly as given.
    ///
    /// # Arguments
    ///
    /// * `.directory_url(&str)`: **Required.** A directory URL, typically one returned by
    ///   [`ClimatePdfs::list_directories`].
    ///
    /// # Errors
    ///
    /// Returns [`ClimatePdfsError::Listing`] if the page cannot be fetched or read.
    #[builder]
    pub async fn list_pdfs(&self, directory_url: &str) -> Result<Vec<String>, ClimatePdfsError> {
        Ok(pdfs::list_pdfs(&self.client, directory_url).await?)
    }

    /// Downloads a single PDF into `{directory}/climate/{year}/{file_name}`.
    ///
    /// The year is the first run of exactly four digits in the URL once `%20`
    /// tokens are removed (`unknown` if there is none). The file name is the last
    /// URL segment with `%20` turned into `_` and parentheses removed; see
    /// [`DownloadTarget`]. Missing directories are created.
    ///
    /// If a file with that name is already in the year directory the download is
    /// skipped, unless `overwrite` is set.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.url(&str)`: **Required.** The PDF URL.
    /// * `.directory(impl Into<PathBuf>)`: Optional. Base directory. Defaults to [`DEFAULT_DOWNLOAD_DIR`].
    /// * `.overwrite(bool)`: Optional. Re-download even if the file exists. Defaults to `false`.
    ///
    /// # Returns
    ///
    /// The path of the file, whether or not it was fetched by this call.
    ///
    /// # Errors
    ///
    /// Returns [`ClimatePdfsError::Download`] if the fetch fails or a directory or
    /// file cannot be created or written. A failed fetch may leave a partial file behind.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use climate_pdfs::{ClimatePdfs, ClimatePdfsError};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), ClimatePdfsError> {
    /// let client = ClimatePdfs::new();
    /// let path = client
    ///     .download_pdf()
    ///     .url("https://example.org/cad/DIR/Report%20(2019).pdf")
    ///     .directory("out")
    ///     .call()
    ///     .await?;
    /// assert_eq!(path, std::path::Path::new("out/climate/2019/Report_2019.pdf"));
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn download_pdf(
        &self,
        url: &str,
        #[builder(into)] directory: Option<PathBuf>,
        overwrite: Option<bool>,
    ) -> Result<PathBuf, ClimatePdfsError> {
        let directory = directory.unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));
        let overwrite = overwrite.unwrap_or(false);
        Ok(self
            .downloader
            .download_pdf(url, &directory, overwrite)
            .await?)
    }

    /// Downloads many PDFs, applying [`ClimatePdfs::download_pdf`] to each URL.
    ///
    /// All URLs share the same `directory` and `overwrite` settings. The returned
    /// paths are in the same order as `urls`, even when downloads run in parallel.
    ///
    /// URLs that land on the same path run one after another, so a repeated
    /// URL is fetched once unless `overwrite` is set.
    ///
    /// The batch stops at the first failure (in input order) and returns that
    /// error. Downloads still in flight are cancelled and leave no file behind;
    /// files completed before the failure are kept.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.urls(&[String])`: **Required.** The PDF URLs.
    /// * `.directory(impl Into<PathBuf>)`: Optional. Base directory. Defaults to [`DEFAULT_DOWNLOAD_DIR`].
    /// * `.overwrite(bool)`: Optional. Defaults to `false`.
    /// * `.concurrency(usize)`: Optional. Maximum target paths downloaded at once.
    ///   Defaults to `1`; `0` is treated as `1`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use climate_pdfs::{ClimatePdfs, ClimatePdfsError};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), ClimatePdfsError> {
    /// let client = ClimatePdfs::new();
    /// let urls = vec![
    ///     "https://example.org/cad/Normals/Normals%20(1991-2020).pdf".to_string(),
    ///     "https://example.org/cad/Outlook/Outlook%202024.pdf".to_string(),
    /// ];
    /// let paths = client
    ///     .download_pdfs()
    ///     .urls(&urls)
    ///     .concurrency(4)
    ///     .call()
    ///     .await?;
    /// assert_eq!(paths.len(), urls.len());
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn download_pdfs(
        &self,
        urls: &[String],
        #[builder(into)] directory: Option<PathBuf>,
        overwrite: Option<bool>,
        concurrency: Option<usize>,
    ) -> Result<Vec<PathBuf>, ClimatePdfsError> {
        let directory = directory.unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));
        let overwrite = overwrite.unwrap_or(false);
        let concurrency = concurrency.unwrap_or(1);
        Ok(self
            .downloader
            .download_pdfs(urls, &directory, overwrite, concurrency)
            .await?)
    }

    /// Lists the PDFs of one directory page and downloads all of them.
    ///
    /// Equivalent to [`ClimatePdfs::list_pdfs`] followed by [`ClimatePdfs::download_pdfs`],
    /// with the same optional settings as the latter.
    #[builder]
    pub async fn download_directory(
        &self,
        directory_url: &str,
        #[builder(into)] directory: Option<PathBuf>,
        overwrite: Option<bool>,
        concurrency: Option<usize>,
    ) -> Result<Vec<PathBuf>, ClimatePdfsError> {
        let pdf_urls = self.list_pdfs().directory_url(directory_url).call().await?;
        self.download_pdfs()
            .urls(&pdf_urls)
            .maybe_directory(directory)
            .maybe_overwrite(overwrite)
            .maybe_concurrency(concurrency)
            .call()
            .await
    }

    /// Computes where [`ClimatePdfs::download_pdf`] would place `url`, without any I/O.
    ///
    /// # Examples
    ///
    /// ```
    /// # use climate_pdfs::ClimatePdfs;
    /// let client = ClimatePdfs::new();
    /// let target = client
    ///     .download_target()
    ///     .url("https://example.org/cad/x/Rainfall%20Outlook%202024.pdf")
    ///     .call();
    /// assert_eq!(target.year(), "2024");
    /// assert_eq!(target.file_name(), "Rainfall_Outlook_2024.pdf");
    /// ```
    #[builder]
    pub fn download_target(
        &self,
        url: &str,
        #[builder(into)] directory: Option<PathBuf>,
    ) -> DownloadTarget {
        let directory = directory.unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));
        DownloadTarget::new(url, directory)
    }
}
