//! Query resolution: validate, consult memory, retrieve, summarize, store.
mod types;

use tracing::{debug, info, info_span, warn};

use crate::classifier::{QueryClassifier, RejectionStage, Verdict};
use crate::memory::MemoryStore;
use crate::retriever::{DEFAULT_NUM_RESULTS, Retriever};
use crate::summarizer::{SUMMARY_FAILED, Summarizer};

pub use types::{PipelineError, QueryResult, RULE_REJECTION, SEMANTIC_REJECTION, Source, Stage};

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    classifier: Option<QueryClassifier>,
    memory: Option<MemoryStore>,
    retriever: Option<Retriever>,
    summarizer: Option<Summarizer>,
    num_results: Option<usize>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classifier(mut self, classifier: QueryClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn memory(mut self, memory: MemoryStore) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn summarizer(mut self, summarizer: Summarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Number of search results to scrape per fresh query. Defaults to
    /// [`DEFAULT_NUM_RESULTS`]; zero is raised to one.
    pub fn num_results(mut self, num_results: usize) -> Self {
        self.num_results = Some(num_results);
        self
    }

    /// Builds the pipeline.
    ///
    /// # Panics
    ///
    /// Panics if the classifier, memory, retriever or summarizer was not set.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            classifier: self
                .classifier
                .expect("classifier must be set via classifier() method"),
            memory: self.memory.expect("memory must be set via memory() method"),
            retriever: self
                .retriever
                .expect("retriever must be set via retriever() method"),
            summarizer: self
                .summarizer
                .expect("summarizer must be set via summarizer() method"),
            num_results: self.num_results.unwrap_or(DEFAULT_NUM_RESULTS).max(1),
        }
    }
}

/// Resolves queries through the full stage sequence.
///
/// All collaborators are owned by the pipeline and shared across concurrent
/// calls; `resolve` takes `&self`.
pub struct Pipeline {
    classifier: QueryClassifier,
    memory: MemoryStore,
    retriever: Retriever,
    summarizer: Summarizer,
    num_results: usize,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn num_results(&self) -> usize {
        self.num_results
    }

    /// Resolves `query`.
    ///
    /// Rejections and memory hits are ordinary results. The only error is
    /// [`PipelineError::RetrievalExhausted`], raised when a valid query
    /// produced no usable page content.
    pub fn resolve(&self, query: &str) -> Result<QueryResult, PipelineError> {
        let query = query.trim();
        let span = info_span!("resolve", query);
        let _guard = span.enter();

        enter(Stage::RuleCheck);
        if let Verdict::Rejected(stage) = self.classifier.validate(query) {
            return Ok(reject(stage));
        }

        enter(Stage::MemoryCheck);
        let embedding = self.memory.embed(query);
        if let Some(found) = embedding
            .as_deref()
            .and_then(|e| self.memory.lookup_embedding(e))
        {
            enter(Stage::Done);
            info!(matched = %found.query, score = found.score, "answered from memory");
            return Ok(QueryResult::from_memory(found.summary));
        }

        enter(Stage::Retrieve);
        let content = self.retriever.fetch(query, self.num_results);
        if content.is_empty() {
            warn!("no usable content retrieved");
            return Err(PipelineError::RetrievalExhausted {
                query: query.to_string(),
            });
        }
        let (text, links) = content.into_parts();

        enter(Stage::Summarize);
        let summary = self.summarizer.summarize(&text, Some(query));

        enter(Stage::Store);
        if summary == SUMMARY_FAILED {
            warn!("summarization failed; result not stored");
        } else {
            self.memory.store(query, embedding.as_deref(), &summary);
        }

        enter(Stage::Done);
        info!(links = links.len(), "answered from fresh retrieval");
        Ok(QueryResult::fresh(summary, links))
    }
}

fn enter(stage: Stage) {
    debug!(%stage, "entering stage");
}

fn reject(stage: RejectionStage) -> QueryResult {
    enter(Stage::Rejected);
    info!(source = %Source::from(stage), at = %Stage::from(stage), "query rejected");
    QueryResult::rejected(stage)
}
