//! Scripted collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sift::classifier::{FailurePolicy, QueryClassifier, RuleFilter, SemanticClassifier};
use sift::embedder::Embedder;
use sift::llm::{GenerativeModel, ModelError, Prompt};
use sift::retriever::{FetchError, PageFetcher, Retriever, SearchError, SearchHit, SearchProvider};
use sift::{Database, MemoryStore, Pipeline, Summarizer};

/// Replies with a fixed answer, or an HTTP error status.
pub struct ScriptedModel {
    reply: Result<String, u16>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn ok(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(status),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GenerativeModel for ScriptedModel {
    fn generate(&self, _prompt: &Prompt) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .map_err(|status| ModelError::Http { status })
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Embeds by bag of words over a tiny fixed vocabulary, so paraphrases land
/// close together and unrelated queries are orthogonal.
pub struct WordEmbedder;

const VOCABULARY: [&str; 8] = [
    "laptop", "laptops", "2025", "best", "top", "rome", "history", "weather",
];

impl Embedder for WordEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|term| words.iter().filter(|w| *w == term).count() as f32)
            .collect();
        // Fold plural into singular.
        vector[0] += vector[1];
        vector[1] = 0.0;
        Ok(vector)
    }
}

/// Search provider and page fetcher backed by an in-memory site map.
pub struct FakeWeb {
    pages: HashMap<String, String>,
    order: Vec<String>,
    pub searches: AtomicUsize,
}

impl FakeWeb {
    pub fn new(pages: &[(&str, &str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages
                .iter()
                .map(|(url, title, body)| {
                    (
                        url.to_string(),
                        format!(
                            "<html><head><title>{title}</title></head><body><nav>Home</nav><p>{body}</p></body></html>"
                        ),
                    )
                })
                .collect(),
            order: pages.iter().map(|(url, _, _)| url.to_string()).collect(),
            searches: AtomicUsize::new(0),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(&[])
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

impl SearchProvider for FakeWeb {
    fn search(&self, _query: &str, n: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self.order.iter().take(n).map(SearchHit::new).collect())
    }
}

impl PageFetcher for FakeWeb {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or(FetchError::Http { status: 404 })
    }
}

pub fn laptop_web() -> Arc<FakeWeb> {
    FakeWeb::new(&[
        (
            "https://reviews.example.com/laptops",
            "Best Laptops 2025",
            "Our testing found the X1 Carbon to be the best overall laptop this year.",
        ),
        (
            "https://tech.example.org/buying-guide",
            "Laptop Buying Guide",
            "Battery life and display quality matter most when choosing a 2025 laptop.",
        ),
        (
            "https://blog.example.net/picks",
            "Editor Picks",
            "For students, the Air M4 offers the best balance of weight and performance.",
        ),
    ])
}

pub fn pipeline(
    db: Database,
    web: Arc<FakeWeb>,
    classifier: Arc<ScriptedModel>,
    summarizer: Arc<ScriptedModel>,
) -> Pipeline {
    Pipeline::builder()
        .classifier(QueryClassifier::new(
            RuleFilter::new(),
            SemanticClassifier::new(classifier, FailurePolicy::Open),
        ))
        .memory(MemoryStore::new(db, Arc::new(WordEmbedder), 0.8))
        .retriever(Retriever::new(web.clone(), web))
        .summarizer(Summarizer::hosted_with_fallback(summarizer, None))
        .build()
}
