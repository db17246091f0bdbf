use crate::download::error::DownloadError;
use crate::types::download_target::DownloadTarget;
use crate::utils::{dir_contains, ensure_dir_exists, send_checked};
use futures_util::{stream, StreamExt, TryStreamExt};
use log::{debug, info};
use reqwest::Client;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::pin;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Suffix of the temporary file a download is streamed into before it is moved into place.
const PARTIAL_SUFFIX: &str = ".part";

pub struct PdfDownloader {
    download_client: Client,
}

impl PdfDownloader {
    pub fn new(download_client: Client) -> Self {
        PdfDownloader { download_client }
    }

    /// Downloads `url` into its year directory below `directory` and returns the file path.
    ///
    /// The fetch is skipped when a file of the same name is already present,
    /// unless `overwrite` is set.
    pub async fn download_pdf(
        &self,
        url: &str,
        directory: &Path,
        overwrite: bool,
    ) -> Result<PathBuf, DownloadError> {
        let target = DownloadTarget::new(url, directory);
        ensure_dir_exists(target.dir()).await?;

        let file_path = target.path();
        if overwrite || !dir_contains(target.dir(), target.file_name()).await? {
            self.fetch_to_file(url, &target).await?;
        } else {
            debug!(
                "Skipping {}, {} already exists",
                url,
                file_path.display()
            );
        }
        Ok(file_path)
    }

    /// Downloads every URL with the same `directory` and `overwrite`, returning paths in input order.
    ///
    /// URLs are grouped by the file they land in. Each group runs in input order,
    /// so a repeated target sees the file its earlier URL wrote, and at most
    /// `concurrency` groups are in flight at once.
    ///
    /// The first failure aborts the batch: no further groups are started and
    /// groups still in flight are cancelled without leaving a file behind.
    /// Files completed before the failure stay on disk.
    pub async fn download_pdfs(
        &self,
        urls: &[String],
        directory: &Path,
        overwrite: bool,
        concurrency: usize,
    ) -> Result<Vec<PathBuf>, DownloadError> {
        let paths: Vec<PathBuf> = urls
            .iter()
            .map(|url| DownloadTarget::new(url, directory).path())
            .collect();

        let groups = group_by_target(urls, &paths);

        info!(
            "Downloading {} PDFs ({} distinct files) to {} ({} at a time)",
            urls.len(),
            groups.len(),
            directory.display(),
            concurrency.max(1)
        );
        stream::iter(groups)
            .map(|group| async move {
                for url in group {
                    self.download_pdf(url, directory, overwrite).await?;
                }
                Ok::<(), DownloadError>(())
            })
            .buffered(concurrency.max(1))
            .try_collect::<Vec<()>>()
            .await?;

        Ok(paths)
    }

    /// Streams the body of `url` into a temporary sibling of the target, then moves it into place.
    ///
    /// The temporary file is removed if the download fails or is cancelled, so
    /// the target path only ever holds a complete download.
    async fn fetch_to_file(&self, url: &str, target: &DownloadTarget) -> Result<(), DownloadError> {
        let path = target.path();
        info!("Downloading {} to {}", url, path.display());

        let response = send_checked(&self.download_client, url)
            .await
            .map_err(|e| DownloadError::from_request(url, e))?;

        let (std_file, partial_path) = tempfile::Builder::new()
            .prefix(target.file_name())
            .suffix(PARTIAL_SUFFIX)
            .tempfile_in(target.dir())
            .map_err(|e| DownloadError::FileWrite(path.clone(), e))?
            .into_parts();
        let mut file = File::from_std(std_file);

        let mut stream = pin!(response.bytes_stream());
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::Stream(url.to_string(), e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::FileWrite(path.clone(), e))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| DownloadError::FileWrite(path.clone(), e))?;
        drop(file);

        partial_path
            .persist(&path)
            .map_err(|e| DownloadError::FileWrite(path.clone(), e.error))?;

        info!("Wrote {} bytes to {}", written, path.display());
        Ok(())
    }
}

/// Groups `urls` by target path, ordered by first occurrence.
fn group_by_target<'a>(urls: &'a [String], paths: &[PathBuf]) -> Vec<Vec<&'a str>> {
    let mut group_of: HashMap<&Path, usize> = HashMap::new();
    let mut groups: Vec<Vec<&'a str>> = Vec::new();
    for (url, path) in urls.iter().zip(paths) {
        let index = *group_of.entry(path.as_path()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[index].push(url);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PDF_BYTES: &[u8] = b"%PDF-1.4\n% climate data\n%%EOF\n";

    fn downloader() -> PdfDownloader {
        PdfDownloader::new(Client::new())
    }

    async fn mount_pdf(server: &MockServer, pdf_path: &str, expected_fetches: u64) {
        Mock::given(method("GET"))
            .and(path(pdf_path))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PDF_BYTES))
            .expect(expected_fetches)
            .mount(server)
            .await;
    }

    #[test]
    fn test_group_by_target_merges_same_file() {
        let urls = vec![
            "https://example.org/cad/2020/a%20b.pdf".to_string(),
            "https://example.org/cad/2021/c.pdf".to_string(),
            "https://example.org/cad/2020/a_b.pdf".to_string(),
        ];
        let paths: Vec<PathBuf> = urls
            .iter()
            .map(|url| DownloadTarget::new(url, "out").path())
            .collect();
        assert_eq!(
            group_by_target(&urls, &paths),
            [
                vec![urls[0].as_str(), urls[2].as_str()],
                vec![urls[1].as_str()],
            ]
        );
    }

    #[tokio::test]
    async fn test_download_creates_year_partitioned_file() -> Result<(), DownloadError> {
        let tmp = TempDir::new().expect("temp dir");
        let out = tmp.path().join("out");
        let server = MockServer::start().await;
        mount_pdf(&server, "/cad/DIR/Report%20(2019).pdf", 1).await;

        let url = format!("{}/cad/DIR/Report%20(2019).pdf", server.uri());
        let file_path = downloader().download_pdf(&url, &out, false).await?;

        assert_eq!(file_path, out.join("climate/2019/Report_2019.pdf"));
        assert_eq!(std::fs::read(&file_path).expect("read pdf"), PDF_BYTES);
        Ok(())
    }

    #[tokio::test]
    async fn test_download_twice_fetches_once() -> Result<(), DownloadError> {
        let tmp = TempDir::new().expect("temp dir");
        let server = MockServer::start().await;
        mount_pdf(&server, "/cad/Outlook/Outlook%20for%202020.pdf", 1).await;

        let url = format!("{}/cad/Outlook/Outlook%20for%202020.pdf", server.uri());
        let first = downloader().download_pdf(&url, tmp.path(), false).await?;
        let second = downloader().download_pdf(&url, tmp.path(), false).await?;

        assert_eq!(first, second);
        assert_eq!(first, tmp.path().join("climate/2020/Outlook_for_2020.pdf"));
        Ok(())
    }

    #[tokio::test]
    async fn test_overwrite_fetches_every_time() -> Result<(), DownloadError> {
        let tmp = TempDir::new().expect("temp dir");
        let server = MockServer::start().await;
        mount_pdf(&server, "/cad/Normals/normals_2021.pdf", 2).await;

        let url = format!("{}/cad/Normals/normals_2021.pdf", server.uri());
        downloader().download_pdf(&url, tmp.path(), true).await?;
        let file_path = downloader().download_pdf(&url, tmp.path(), true).await?;

        assert_eq!(std::fs::read(&file_path).expect("read pdf"), PDF_BYTES);
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_file_is_left_untouched() -> Result<(), DownloadError> {
        let tmp = TempDir::new().expect("temp dir");
        let year_dir = tmp.path().join("climate/2018");
        std::fs::create_dir_all(&year_dir).expect("create year dir");
        std::fs::write(year_dir.join("annual_2018.pdf"), b"local copy").expect("write file");

        let server = MockServer::start().await;
        mount_pdf(&server, "/cad/annual_2018.pdf", 0).await;

        let url = format!("{}/cad/annual_2018.pdf", server.uri());
        let file_path = downloader().download_pdf(&url, tmp.path(), false).await?;

        assert_eq!(std::fs::read(file_path).expect("read file"), b"local copy");
        Ok(())
    }

    #[tokio::test]
    async fn test_url_without_year_goes_to_unknown_bucket() -> Result<(), DownloadError> {
        let tmp = TempDir::new().expect("temp dir");
        let server = MockServer::start().await;
        mount_pdf(&server, "/cad/summary.pdf", 1).await;

        let url = format!("{}/cad/summary.pdf", server.uri());
        let file_path = downloader().download_pdf(&url, tmp.path(), false).await?;

        assert_eq!(file_path, tmp.path().join("climate/unknown/summary.pdf"));
        assert!(file_path.is_file());
        Ok(())
    }

    #[tokio::test]
    async fn test_http_error_surfaces_as_download_error() {
        let tmp = TempDir::new().expect("temp dir");
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cad/missing_2022.pdf"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = format!("{}/cad/missing_2022.pdf", server.uri());
        let result = downloader().download_pdf(&url, tmp.path(), false).await;

        match result {
            Err(e @ DownloadError::HttpStatus { .. }) => {
                assert!(!e.is_io());
                assert!(e.to_string().contains("500"));
            }
            other => panic!("Expected HttpStatus error, got {:?}", other),
        }
        // The year directory is created before the fetch is attempted.
        assert!(tmp.path().join("climate/2022").is_dir());
    }

    #[tokio::test]
    async fn test_blocked_directory_is_io_error() {
        let tmp = TempDir::new().expect("temp dir");
        std::fs::write(tmp.path().join("climate"), b"not a directory").expect("write file");

        let result = downloader()
            .download_pdf("http://127.0.0.1:1/cad/report_2020.pdf", tmp.path(), false)
            .await;

        match result {
            Err(e) => assert!(e.is_io(), "expected an I/O error, got {:?}", e),
            Ok(p) => panic!("Expected failure, got {}", p.display()),
        }
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() -> Result<(), DownloadError> {
        let tmp = TempDir::new().expect("temp dir");
        let server = MockServer::start().await;
        let names = ["c_2003.pdf", "a_2001.pdf", "b_2002.pdf"];
        for name in names {
            mount_pdf(&server, &format!("/cad/{}", name), 1).await;
        }
        let urls: Vec<String> = names
            .iter()
            .map(|name| format!("{}/cad/{}", server.uri(), name))
            .collect();

        let sequential = tmp.path().join("sequential");
        let paths = downloader()
            .download_pdfs(&urls, &sequential, false, 1)
            .await?;
        assert_eq!(
            paths,
            [
                sequential.join("climate/2003/c_2003.pdf"),
                sequential.join("climate/2001/a_2001.pdf"),
                sequential.join("climate/2002/b_2002.pdf"),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_parallel_batch_preserves_input_order() -> Result<(), DownloadError> {
        let tmp = TempDir::new().expect("temp dir");
        let server = MockServer::start().await;
        // The first file is the slowest, so it completes last.
        Mock::given(method("GET"))
            .and(path("/cad/slow_1999.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(PDF_BYTES)
                    .set_delay(std::time::Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_pdf(&server, "/cad/fast_2000.pdf", 1).await;
        mount_pdf(&server, "/cad/fast_2001.pdf", 1).await;

        let urls: Vec<String> = ["slow_1999.pdf", "fast_2000.pdf", "fast_2001.pdf"]
            .iter()
            .map(|name| format!("{}/cad/{}", server.uri(), name))
            .collect();
        let paths = downloader()
            .download_pdfs(&urls, tmp.path(), false, 3)
            .await?;

        assert_eq!(
            paths,
            [
                tmp.path().join("climate/1999/slow_1999.pdf"),
                tmp.path().join("climate/2000/fast_2000.pdf"),
                tmp.path().join("climate/2001/fast_2001.pdf"),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_batch_fails_fast() {
        let tmp = TempDir::new().expect("temp dir");
        let server = MockServer::start().await;
        mount_pdf(&server, "/cad/ok_2010.pdf", 1).await;
        Mock::given(method("GET"))
            .and(path("/cad/gone_2011.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        mount_pdf(&server, "/cad/never_2012.pdf", 0).await;

        let urls: Vec<String> = ["ok_2010.pdf", "gone_2011.pdf", "never_2012.pdf"]
            .iter()
            .map(|name| format!("{}/cad/{}", server.uri(), name))
            .collect();
        let result = downloader()
            .download_pdfs(&urls, tmp.path(), false, 1)
            .await;

        assert!(matches!(result, Err(DownloadError::HttpStatus { .. })));
        assert!(tmp.path().join("climate/2010/ok_2010.pdf").is_file());
        assert!(!tmp.path().join("climate/2012").exists());
    }

    fn slow_pdf(delay_ms: u64) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_bytes(PDF_BYTES)
            .set_delay(std::time::Duration::from_millis(delay_ms))
    }

    #[tokio::test]
    async fn test_repeated_url_in_parallel_batch_fetches_once() -> Result<(), DownloadError> {
        let tmp = TempDir::new().expect("temp dir");
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cad/outlook_2024.pdf"))
            .respond_with(slow_pdf(100))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/cad/outlook_2024.pdf", server.uri());
        let paths = downloader()
            .download_pdfs(&[url.clone(), url], tmp.path(), false, 2)
            .await?;

        let expected = tmp.path().join("climate/2024/outlook_2024.pdf");
        assert_eq!(paths, [expected.clone(), expected.clone()]);
        assert_eq!(std::fs::read(expected).expect("read pdf"), PDF_BYTES);
        Ok(())
    }

    #[tokio::test]
    async fn test_repeated_url_with_overwrite_fetches_each_time() -> Result<(), DownloadError> {
        let tmp = TempDir::new().expect("temp dir");
        let server = MockServer::start().await;
        mount_pdf(&server, "/cad/outlook_2024.pdf", 2).await;

        let url = format!("{}/cad/outlook_2024.pdf", server.uri());
        let paths = downloader()
            .download_pdfs(&[url.clone(), url], tmp.path(), true, 2)
            .await?;

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], paths[1]);
        Ok(())
    }

    #[tokio::test]
    async fn test_parallel_batch_failure_leaves_no_partial_file() {
        let tmp = TempDir::new().expect("temp dir");
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cad/gone_2011.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cad/later_2012.pdf"))
            .respond_with(slow_pdf(300))
            .mount(&server)
            .await;

        let urls: Vec<String> = ["gone_2011.pdf", "later_2012.pdf"]
            .iter()
            .map(|name| format!("{}/cad/{}", server.uri(), name))
            .collect();
        let result = downloader()
            .download_pdfs(&urls, tmp.path(), false, 2)
            .await;

        assert!(matches!(result, Err(DownloadError::HttpStatus { .. })));
        // The in-flight download was cancelled; nothing under the year directory
        // can satisfy a later skip-if-exists check.
        let later_dir = tmp.path().join("climate/2012");
        let leftovers = std::fs::read_dir(&later_dir)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_completed_download_leaves_only_the_target() -> Result<(), DownloadError> {
        let tmp = TempDir::new().expect("temp dir");
        let server = MockServer::start().await;
        mount_pdf(&server, "/cad/rainfall_2016.pdf", 1).await;

        let url = format!("{}/cad/rainfall_2016.pdf", server.uri());
        downloader().download_pdf(&url, tmp.path(), false).await?;

        let names: Vec<_> = std::fs::read_dir(tmp.path().join("climate/2016"))
            .expect("read year dir")
            .map(|entry| entry.expect("dir entry").file_name())
            .collect();
        assert_eq!(names, ["rainfall_2016.pdf"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_batch() -> Result<(), DownloadError> {
        let tmp = TempDir::new().expect("temp dir");
        let paths = downloader().download_pdfs(&[], tmp.path(), false, 0).await?;
        assert!(paths.is_empty());
        Ok(())
    }
}
