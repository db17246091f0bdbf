//! Derivation of the local, year-partitioned path a PDF URL is downloaded to.

use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Name of the subdirectory placed between the base download directory and the year bucket.
pub(crate) const CLIMATE_SUBDIR: &str = "climate";

/// Year bucket used when a URL contains no 4-digit run.
pub const UNKNOWN_YEAR: &str = "unknown";

// A run of exactly four ASCII digits, bounded by non-digits or the ends of the string.
static YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{4})(?:[^0-9]|$)").expect("year pattern is valid")
});

/// Where a PDF URL lands on disk: `{directory}/climate/{year}/{file_name}`.
///
/// Built purely from the URL string, so computing a target never touches
/// the network or the filesystem.
///
/// The year is the first run of exactly four digits once `%20` tokens are
/// removed. Other escapes are left in place while searching, so an encoded
/// parenthesis glued to a year (`%282019%29`) makes a longer digit run and
/// does not count: `Report%20%282019%29.pdf` lands in the [`UNKNOWN_YEAR`]
/// bucket as `Report_2019.pdf`.
///
/// # Examples
///
/// ```
/// use climate_pdfs::DownloadTarget;
/// use std::path::Path;
///
/// let target = DownloadTarget::new(
///     "https://example.org/cad/DIR/Climate%20Data%20(1991-2020).pdf",
///     "data-raw",
/// );
/// assert_eq!(target.year(), "1991");
/// assert_eq!(target.file_name(), "Climate_Data_1991-2020.pdf");
/// assert_eq!(
///     target.path(),
///     Path::new("data-raw/climate/1991/Climate_Data_1991-2020.pdf")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadTarget {
    year: String,
    file_name: String,
    dir: PathBuf,
}

impl DownloadTarget {
    /// Computes the target for `url` below the base `directory`.
    pub fn new(url: &str, directory: impl AsRef<Path>) -> Self {
        let year = extract_year(url).unwrap_or_else(|| UNKNOWN_YEAR.to_string());
        let file_name = sanitize_file_name(url);
        let dir = directory.as_ref().join(CLIMATE_SUBDIR).join(&year);
        Self {
            year,
            file_name,
            dir,
        }
    }

    /// The year bucket, or [`UNKNOWN_YEAR`] when the URL has no 4-digit run.
    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The year directory, `{directory}/climate/{year}`.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The full file path, `{directory}/climate/{year}/{file_name}`.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

impl fmt::Display for DownloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

/// First run of exactly four digits in the URL once `%20` tokens are removed.
pub(crate) fn extract_year(url: &str) -> Option<String> {
    let compact = url.replace("%20", "");
    YEAR_PATTERN
        .captures(&compact)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Last path segment with `%20` turned into `_` and parentheses (encoded or literal) dropped.
pub(crate) fn sanitize_file_name(url: &str) -> String {
    let base = url.rsplit('/').next().unwrap_or(url);
    base.replace("%20", "_")
        .replace("%28", "")
        .replace("%29", "")
        .replace(['(', ')'], "")
}
