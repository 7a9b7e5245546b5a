use crate::errors::ScraperError;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;
use tokio::time::sleep;

/// Anything that can hand back the HTML behind a URL.
#[async_trait]
pub trait PageSource: Send {
    async fn fetch_page(&mut self, url: &str) -> Result<String, ScraperError>;
}

/// Timeout and retry settings for [`ScraperClient`].
#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub max_retries: u8,
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 0,
            retry_delay: Duration::from_secs(2),
        }
    }
}

pub struct ScraperClient {
    client: Client,
    request_id: u64,
    stats: ScraperClientStats,
    max_retries: u8,
    retry_delay: Duration,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScraperClientStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
}

impl ScraperClient {
    /// Create a new scraper client with the default timeout and no retries
    pub fn new_http() -> Result<Self, ScraperError> {
        Self::new_with_config(ClientConfig::default())
    }

    /// Create a new scraper client with a custom timeout, retries, and delay between retries
    pub fn new_with_config(config: ClientConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .default_headers(Self::default_headers())
            .timeout(config.timeout)
            .pool_idle_timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            request_id: 0,
            stats: ScraperClientStats::default(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    /// Default headers for the client
    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("calend-scraper/", env!("CARGO_PKG_VERSION"))),
        );
        headers
    }

    /// Fetch the content of the web page, retrying up to `max_retries` times
    pub async fn fetch_url(&mut self, url: &str) -> Result<String, ScraperError> {
        self.request_id += 1;
        debug!("Fetching {} with request ID: {}", url, self.request_id);

        let mut attempts: u32 = 0;
        let mut last_status = None;
        let start_time = Instant::now();

        while attempts <= u32::from(self.max_retries) {
            attempts += 1;
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.text().await?;
                        self.record_success();
                        debug!(
                            "Fetched {} on attempt {} after {:?}",
                            url,
                            attempts,
                            start_time.elapsed()
                        );
                        return Ok(body);
                    }
                    warn!(
                        "Attempt {}: {} failed with status: {}",
                        attempts, url, status
                    );
                    last_status = Some(status.as_u16());
                }
                Err(e) => {
                    warn!("Attempt {}: request to {} failed: {}", attempts, url, e);
                    last_status = None;
                }
            }

            if attempts <= u32::from(self.max_retries) {
                info!("Retrying in {:?}...", self.retry_delay);
                sleep(self.retry_delay).await;
            }
        }

        self.record_failure();

        match last_status {
            Some(status) => Err(ScraperError::StatusError {
                url: url.to_string(),
                status,
            }),
            None => Err(ScraperError::CustomError(format!(
                "Failed to fetch {} after {} attempts in {:?}",
                url,
                attempts,
                start_time.elapsed()
            ))),
        }
    }

    /// Track a successful request in the stats
    fn record_success(&mut self) {
        self.stats.total_requests += 1;
        self.stats.successful_requests += 1;
    }

    /// Track a failed request in the stats
    fn record_failure(&mut self) {
        self.stats.total_requests += 1;
        self.stats.failed_requests += 1;
    }

    pub fn stats(&self) -> ScraperClientStats {
        self.stats
    }

    /// Log the current statistics (total requests, successes, failures)
    pub fn print_stats(&self) {
        info!(
            "Total Requests: {}, Successful: {}, Failed: {}",
            self.stats.total_requests, self.stats.successful_requests, self.stats.failed_requests
        );
    }
}

#[async_trait]
impl PageSource for ScraperClient {
    async fn fetch_page(&mut self, url: &str) -> Result<String, ScraperError> {
        self.fetch_url(url).await
    }
}

/// Serves previously saved pages from a directory. The file for a URL is its
/// last path segment plus `.html`, so `.../holidays/january/` reads
/// `january.html`.
pub struct SavedPageSource {
    dir: PathBuf,
}

impl SavedPageSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, url: &str) -> Result<PathBuf, ScraperError> {
        let segment = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| ScraperError::CustomError(format!("No page name in URL: {}", url)))?;
        Ok(self.dir.join(format!("{}.html", segment)))
    }
}

#[async_trait]
impl PageSource for SavedPageSource {
    async fn fetch_page(&mut self, url: &str) -> Result<String, ScraperError> {
        let path = self.path_for(url)?;
        debug!("Reading saved page {} for {}", path.display(), url);
        Ok(tokio::fs::read_to_string(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(max_retries: u8) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(5),
            max_retries,
            retry_delay: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_fetch_url_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/holidays/january/")
            .match_header("user-agent", mockito::Matcher::Regex("^calend-scraper/".into()))
            .with_status(200)
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let mut client = ScraperClient::new_with_config(quick_config(0)).unwrap();
        let url = format!("{}/holidays/january/", server.url());
        let body = client.fetch_url(&url).await.expect("fetch failed");

        assert_eq!(body, "<html>ok</html>");
        assert_eq!(
            client.stats(),
            ScraperClientStats {
                total_requests: 1,
                successful_requests: 1,
                failed_requests: 0,
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_url_retries_then_reports_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing/")
            .with_status(404)
            .expect(3)
            .create_async()
            .await;

        let mut client = ScraperClient::new_with_config(quick_config(2)).unwrap();
        let url = format!("{}/missing/", server.url());
        let result = client.fetch_url(&url).await;

        match result {
            Err(ScraperError::StatusError { status, .. }) => assert_eq!(status, 404),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert_eq!(client.stats().failed_requests, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_url_without_retries_tries_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/broken/")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let mut client = ScraperClient::new_http().unwrap();
        let url = format!("{}/broken/", server.url());

        assert!(client.fetch_page(&url).await.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_saved_page_source_reads_by_last_segment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("march.html"), "<p>march</p>").unwrap();

        let mut source = SavedPageSource::new(dir.path());
        let body = source
            .fetch_page("https://www.calend.ru/holidays/march/")
            .await
            .unwrap();

        assert_eq!(body, "<p>march</p>");
    }

    #[tokio::test]
    async fn test_saved_page_source_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = SavedPageSource::new(dir.path());

        let result = source.fetch_page("https://www.calend.ru/holidays/april/").await;

        assert!(matches!(result, Err(ScraperError::IoError(_))));
    }

    #[test]
    fn test_saved_page_path_requires_segment() {
        let source = SavedPageSource::new("/tmp");
        assert!(source.path_for("/").is_err());
        assert_eq!(
            source.path_for("http://host/holidays/may").unwrap(),
            PathBuf::from("/tmp/may.html")
        );
    }
}
