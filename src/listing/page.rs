//! Fetching and parsing of the preformatted file listings served by the repository.

use crate::listing::error::ListingError;
use crate::utils::send_checked;
use log::{info, warn};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

// Hyperlinks inside the `<pre>` block of an auto-generated directory listing.
static LISTING_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("pre a").expect("listing selector is valid"));

/// A parsed listing page.
pub(crate) struct ListingPage {
    document: Html,
    url: String,
}

impl ListingPage {
    /// Downloads `url` and parses the body as HTML.
    pub(crate) async fn fetch(client: &Client, url: &str) -> Result<Self, ListingError> {
        info!("Fetching listing page {}", url);

        let response = send_checked(client, url)
            .await
            .map_err(|e| ListingError::from_request(url, e))?;
        let body = response
            .text()
            .await
            .map_err(|e| ListingError::BodyRead(url.to_string(), e))?;

        Ok(Self::parse(url, &body))
    }

    pub(crate) fn parse(url: &str, body: &str) -> Self {
        Self {
            document: Html::parse_document(body),
            url: url.to_string(),
        }
    }

    /// The links of the listing block, in document order.
    pub(crate) fn links(&self) -> Vec<ElementRef<'_>> {
        let links: Vec<_> = self.document.select(&LISTING_LINKS).collect();
        if links.is_empty() {
            warn!("No listing links found on {}", self.url);
        }
        links
    }

    /// Full text content of every listing link.
    pub(crate) fn link_texts(&self) -> Vec<String> {
        self.links()
            .into_iter()
            .map(|link| link.text().collect::<String>())
            .collect()
    }

    /// `href` values of the listing links; anchors without one are skipped.
    pub(crate) fn link_hrefs(&self) -> Vec<String> {
        self.links()
            .into_iter()
            .filter_map(|link| link.value().attr("href"))
            .map(str::to_string)
            .collect()
    }
}
