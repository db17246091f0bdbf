use crate::listing::error::ListingError;
use crate::listing::page::ListingPage;
use log::debug;
use reqwest::Client;

/// Case-sensitive substring a link must contain to count as a PDF.
const PDF_MARKER: &str = "pdf";

/// Fetches one directory page and returns the URL of every PDF it links to.
///
/// `directory_url` is used verbatim: it is neither decoded nor re-encoded.
pub(crate) async fn list_pdfs(
    client: &Client,
    directory_url: &str,
) -> Result<Vec<String>, ListingError> {
    let page = ListingPage::fetch(client, directory_url).await?;
    let hrefs = page.link_hrefs();
    Ok(pdf_urls(directory_url, hrefs))
}

fn pdf_urls(directory_url: &str, hrefs: Vec<String>) -> Vec<String> {
    let total = hrefs.len();
    let urls: Vec<String> = hrefs
        .into_iter()
        .filter(|href| href.contains(PDF_MARKER))
        .map(|href| format!("{}{}", directory_url, href))
        .collect();
    debug!(
        "Kept {} of {} links on {} as PDFs",
        urls.len(),
        total,
        directory_url
    );
    urls
}
