use std::time::Duration;

use thiserror::Error;

/// User-Agent sent with page requests; many sites refuse the reqwest default.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; sift/0.1)";

/// Default per-page fetch timeout.
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to fetch page: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Page fetch timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("Page HTTP error: status {status}")]
    Http { status: u16 },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Network(err)
        }
    }
}

/// Retrieves the HTML of a page.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches pages over HTTP with a bounded timeout.
#[derive(Debug)]
pub struct HttpPageFetcher {
    client: reqwest::blocking::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        Ok(response.text()?)
    }
}
