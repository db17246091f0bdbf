use climate_pdfs::{ClimatePdfs, ClimatePdfsError};

#[tokio::main]
async fn main() -> Result<(), ClimatePdfsError> {
    let client = ClimatePdfs::new();

    let directories = client.list_directories().call().await?;
    println!("Found {} directories:", directories.len());
    for directory_url in &directories {
        println!("  {}", directory_url);
    }

    let Some(directory_url) = directories.first() else {
        return Ok(());
    };
    let pdf_urls = client.list_pdfs().directory_url(directory_url).call().await?;
    println!("{} PDFs in {}", pdf_urls.len(), directory_url);

    let paths = client
        .download_pdfs()
        .urls(&pdf_urls)
        .concurrency(4)
        .call()
        .await?;
    for path in paths {
        println!("{}", path.display());
    }

    Ok(())
}
