use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Upper bound on results per request accepted by JSON search APIs.
pub const MAX_RESULTS_PER_REQUEST: usize = 10;

/// Errors raised by a search provider.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Search HTTP error: status {status}")]
    Http { status: u16 },

    #[error("Malformed search response: {0}")]
    Parse(String),

    #[error("Invalid search endpoint: {0}")]
    InvalidUrl(String),
}

/// One search result item. Either field may be absent in provider output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHit {
    pub url: Option<String>,
    pub title: Option<String>,
}

impl SearchHit {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            title: None,
        }
    }
}

/// A web search capability.
pub trait SearchProvider: Send + Sync {
    /// Returns up to `num_results` hits in rank order.
    fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}

/// Search over a JSON HTTP API.
///
/// Sends `GET {endpoint}?key=..&cx=..&q=..&num=..` and reads `items[].link`
/// and `items[].title` from the response. `cx` is only sent when an engine id
/// is configured.
pub struct HttpSearchProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    engine_id: Option<String>,
}

impl std::fmt::Debug for HttpSearchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSearchProvider")
            .field("endpoint", &self.endpoint)
            .field("engine_id", &self.engine_id)
            .finish_non_exhaustive()
    }
}

impl HttpSearchProvider {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        engine_id: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let endpoint = endpoint.into();
        reqwest::Url::parse(&endpoint)
            .map_err(|e| SearchError::InvalidUrl(format!("{}: {}", endpoint, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(SearchError::Network)?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            engine_id,
        })
    }

    fn query_params(&self, query: &str, num_results: usize) -> Vec<(&'static str, String)> {
        let num = num_results.clamp(1, MAX_RESULTS_PER_REQUEST);
        let mut params = vec![("key", self.api_key.clone())];
        if let Some(cx) = &self.engine_id {
            params.push(("cx", cx.clone()));
        }
        params.push(("q", query.to_string()));
        params.push(("num", num.to_string()));
        params
    }
}

impl SearchProvider for HttpSearchProvider {
    fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query_params(query, num_results))
            .send()
            .map_err(SearchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(SearchError::Network)?;
        let json: Value =
            serde_json::from_str(&body).map_err(|e| SearchError::Parse(e.to_string()))?;

        let mut hits = parse_search_response(&json);
        hits.truncate(num_results);
        Ok(hits)
    }
}

/// Reads `items[]` from a search response. A response without `items` means
/// the search found nothing.
fn parse_search_response(json: &Value) -> Vec<SearchHit> {
    json.get("items")
        .and_then(|items| items.as_array())
        .map(|items| {
            items
                .iter()
                .map(|item| SearchHit {
                    url: item
                        .get("link")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    title: item
                        .get("title")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default()
}
