//! Query-focused summarization with an ordered fallback chain.
mod strategy;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::llm::GenerativeModel;

pub use strategy::{
    HostedSummary, LOCAL_INPUT_CHARS, LOCAL_MAX_TOKENS, LocalSummary, SummaryStrategy,
};

/// Returned when every strategy failed. Never stored in memory.
pub const SUMMARY_FAILED: &str = "[Summary failed]";

/// Builds the summarization prompt.
///
/// With a query the model is asked to answer it from the supplied content;
/// without one it is asked for a plain summary.
///
/// ```
/// use sift::summarizer::build_prompt;
///
/// assert_eq!(build_prompt("text", None), "Summarize this:\n\ntext\n\nSummary:");
/// assert!(build_prompt("text", Some("why?")).contains("\"why?\""));
/// ```
pub fn build_prompt(text: &str, query: Option<&str>) -> String {
    match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => format!(
            "You are a research assistant. A user asked:\n\n\
             \"{query}\"\n\n\
             Use the extracted web content below to craft a helpful, informative, and accurate \
             answer that directly addresses the question. The answer should be clear, insightful, \
             and synthesized.\n\n\
             ### Content:\n{text}\n\n\
             ### Answer:"
        ),
        None => format!("Summarize this:\n\n{text}\n\nSummary:"),
    }
}

/// Runs summary strategies in order until one produces text.
pub struct Summarizer {
    strategies: Vec<Box<dyn SummaryStrategy>>,
}

impl Summarizer {
    pub fn new(strategies: Vec<Box<dyn SummaryStrategy>>) -> Self {
        Self { strategies }
    }

    /// A hosted primary model, optionally backed by a local fallback model.
    pub fn hosted_with_fallback(
        primary: Arc<dyn GenerativeModel>,
        fallback: Option<Arc<dyn GenerativeModel>>,
    ) -> Self {
        let mut strategies: Vec<Box<dyn SummaryStrategy>> =
            vec![Box::new(HostedSummary::new(primary))];
        if let Some(model) = fallback {
            strategies.push(Box::new(LocalSummary::new(model)));
        }
        Self::new(strategies)
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Summarizes `text`, answering `query` when given.
    ///
    /// Never fails: when no strategy yields a non-empty answer the result is
    /// [`SUMMARY_FAILED`].
    pub fn summarize(&self, text: &str, query: Option<&str>) -> String {
        let prompt = build_prompt(text, query);

        for (attempt, strategy) in self.strategies.iter().enumerate() {
            if attempt > 0 {
                info!(strategy = strategy.name(), "falling back to next summarizer");
            }
            match strategy.summarize(&prompt) {
                Ok(summary) if !summary.is_empty() => {
                    info!(strategy = strategy.name(), chars = summary.len(), "summary produced");
                    return summary;
                }
                Ok(_) => warn!(strategy = strategy.name(), "summarizer returned empty text"),
                Err(e) => warn!(strategy = strategy.name(), error = %e, "summarizer failed"),
            }
        }

        error!(strategies = self.strategies.len(), "all summarizers failed");
        SUMMARY_FAILED.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ModelError, Prompt};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubModel {
        reply: Result<&'static str, u16>,
        calls: AtomicUsize,
    }

    impl StubModel {
        fn new(reply: Result<&'static str, u16>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl GenerativeModel for StubModel {
        fn generate(&self, _prompt: &Prompt) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .map_err(|status| ModelError::Http { status })
        }

        fn model(&self) -> &str {
            "stub"
        }
    }

    #[test]
    fn query_prompt_embeds_question_and_content() {
        let prompt = build_prompt("Laptops are great.", Some("best laptop 2025"));
        assert!(prompt.starts_with("You are a research assistant."));
        assert!(prompt.contains("\"best laptop 2025\""));
        assert!(prompt.contains("### Content:\nLaptops are great.\n\n### Answer:"));
    }

    #[test]
    fn blank_query_uses_generic_prompt() {
        assert_eq!(
            build_prompt("x", Some("  ")),
            "Summarize this:\n\nx\n\nSummary:"
        );
    }

    #[test]
    fn primary_success_skips_fallback() {
        let primary = StubModel::new(Ok("Answer."));
        let fallback = StubModel::new(Ok("Fallback."));
        let summarizer =
            Summarizer::hosted_with_fallback(primary.clone(), Some(fallback.clone()));

        assert_eq!(summarizer.summarize("text", Some("q")), "Answer.");
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn primary_failure_uses_fallback() {
        let primary = StubModel::new(Err(503));
        let fallback = StubModel::new(Ok(" Fallback. "));
        let summarizer = Summarizer::hosted_with_fallback(primary, Some(fallback.clone()));

        assert_eq!(summarizer.summarize("text", Some("q")), "Fallback.");
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_primary_output_counts_as_failure() {
        let summarizer = Summarizer::hosted_with_fallback(
            StubModel::new(Ok("   ")),
            Some(StubModel::new(Ok("Fallback."))),
        );
        assert_eq!(summarizer.summarize("text", None), "Fallback.");
    }

    #[test]
    fn sentinel_without_fallback() {
        let summarizer = Summarizer::hosted_with_fallback(StubModel::new(Err(500)), None);
        assert_eq!(summarizer.strategy_count(), 1);
        assert_eq!(summarizer.summarize("text", Some("q")), SUMMARY_FAILED);
    }

    #[test]
    fn sentinel_when_all_fail() {
        let summarizer = Summarizer::hosted_with_fallback(
            StubModel::new(Err(500)),
            Some(StubModel::new(Err(500))),
        );
        assert_eq!(summarizer.summarize("text", Some("q")), SUMMARY_FAILED);
    }
}
