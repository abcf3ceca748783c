//! Web retrieval: search, scrape the top results, aggregate their text.
//!
//! Every failure below the search call is isolated to its page. A failed
//! search, no hits, or no page yielding text all produce an empty
//! [`ScrapedContent`], which callers treat as "nothing found".
mod extract;
mod fetch;
mod search;

use std::sync::Arc;
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use extract::{
    ArticleExtractor, ContentExtractor, MIN_BLOCK_CHARS, ParagraphExtractor, decode_entities,
    default_extractors, extract_title, host_of,
};
pub use fetch::{DEFAULT_PAGE_TIMEOUT, FetchError, HttpPageFetcher, PageFetcher, USER_AGENT};
pub use search::{
    HttpSearchProvider, MAX_RESULTS_PER_REQUEST, SearchError, SearchHit, SearchProvider,
};

/// Results requested per search when the caller does not say otherwise.
pub const DEFAULT_NUM_RESULTS: usize = 5;

/// Length of the per-source snippet, in characters.
pub const SNIPPET_CHARS: usize = 200;

/// A page that contributed content to an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLink {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

/// Aggregated text of all scraped pages for one query, plus their links in
/// search rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedContent {
    text: String,
    links: Vec<SourceLink>,
}

impl ScrapedContent {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn links(&self) -> &[SourceLink] {
        &self.links
    }

    /// `true` when no page produced usable text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_parts(self) -> (String, Vec<SourceLink>) {
        (self.text, self.links)
    }
}

struct ScrapedPage {
    url: String,
    title: String,
    text: String,
}

/// Searches the web and scrapes result pages.
pub struct Retriever {
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    extractors: Vec<Box<dyn ContentExtractor>>,
}

impl Retriever {
    /// Creates a retriever using the default extraction chain.
    pub fn new(search: Arc<dyn SearchProvider>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            search,
            fetcher,
            extractors: default_extractors(),
        }
    }

    /// Replaces the extraction chain. Extractors run in order until one
    /// returns text.
    pub fn with_extractors(mut self, extractors: Vec<Box<dyn ContentExtractor>>) -> Self {
        self.extractors = extractors;
        self
    }

    /// Searches for `query` and scrapes up to `num_results` result pages.
    ///
    /// Pages are fetched concurrently; the output keeps search rank order.
    pub fn fetch(&self, query: &str, num_results: usize) -> ScrapedContent {
        let hits = match self.search.search(query, num_results) {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query, error = %e, "search failed");
                return ScrapedContent::default();
            }
        };
        info!(query, hits = hits.len(), "search completed");

        let urls: Vec<&str> = hits
            .iter()
            .take(num_results)
            .filter_map(|hit| hit.url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .collect();
        if urls.is_empty() {
            return ScrapedContent::default();
        }

        let pages: Vec<Option<ScrapedPage>> = thread::scope(|scope| {
            let handles: Vec<_> = urls
                .iter()
                .map(|url| scope.spawn(move || self.scrape(url)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(None))
                .collect()
        });

        let mut blocks = Vec::new();
        let mut links = Vec::new();
        for page in pages.into_iter().flatten() {
            links.push(SourceLink {
                snippet: make_snippet(&page.text),
                title: page.title,
                url: page.url,
            });
            blocks.push(page.text);
        }

        info!(query, pages = links.len(), "scraping completed");
        ScrapedContent {
            text: blocks.join("\n\n"),
            links,
        }
    }

    fn scrape(&self, url: &str) -> Option<ScrapedPage> {
        debug!(url, "scraping");
        let html = match self.fetcher.fetch(url) {
            Ok(html) => html,
            Err(e) => {
                warn!(url, error = %e, "failed to fetch page");
                return None;
            }
        };

        let Some((extractor, text)) = self
            .extractors
            .iter()
            .find_map(|e| e.extract(&html).map(|text| (e.name(), text)))
        else {
            info!(url, "no usable content; page skipped");
            return None;
        };
        debug!(url, extractor, chars = text.len(), "extracted page text");

        let title = extract_title(&html)
            .or_else(|| host_of(url))
            .unwrap_or_else(|| url.to_string());

        Some(ScrapedPage {
            url: url.to_string(),
            title,
            text,
        })
    }
}

/// First [`SNIPPET_CHARS`] characters of `text` with newlines flattened.
fn make_snippet(text: &str) -> String {
    let head: String = text.chars().take(SNIPPET_CHARS).collect();
    head.trim().replace('\n', " ")
}
