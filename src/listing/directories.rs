use crate::listing::error::ListingError;
use crate::listing::page::ListingPage;
use log::debug;
use reqwest::Client;

/// Link text of the parent-directory entry.
const PARENT_DIRECTORY: &str = "../";
/// Entries containing this marker are bulletin archives, not climate data.
const BULLETIN_MARKER: &str = "Bulletin";

/// Fetches the index page and returns the URL of every climate-data subdirectory.
pub(crate) async fn list_directories(
    client: &Client,
    index_url: &str,
) -> Result<Vec<String>, ListingError> {
    let page = ListingPage::fetch(client, index_url).await?;
    let entries = page.link_texts();
    Ok(directory_urls(index_url, entries))
}

fn directory_urls(index_url: &str, entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .filter(|entry| {
            let keep = entry != PARENT_DIRECTORY && !entry.contains(BULLETIN_MARKER);
            if !keep {
                debug!("Skipping index entry {:?}", entry);
            }
            keep
        })
        .map(|entry| format!("{}{}", index_url, entry).replace(' ', "%20"))
        .collect()
}
