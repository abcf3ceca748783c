//! Types produced by query resolution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::RejectionStage;
use crate::retriever::SourceLink;

/// Summary text of a query rejected by the rule filter.
pub const RULE_REJECTION: &str = "Invalid query (rule-based).";

/// Summary text of a query rejected by the semantic classifier.
pub const SEMANTIC_REJECTION: &str = "Invalid query (LLM-based).";

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Rejected by the syntactic command filter.
    RuleBased,
    /// Rejected by the language-model classifier.
    Llm,
    /// Answered from a stored summary of a similar query.
    Memory,
    /// Answered by a new search and summary.
    Fresh,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RuleBased => write!(f, "rule-based"),
            Self::Llm => write!(f, "llm"),
            Self::Memory => write!(f, "memory"),
            Self::Fresh => write!(f, "fresh"),
        }
    }
}

impl From<RejectionStage> for Source {
    fn from(stage: RejectionStage) -> Self {
        match stage {
            RejectionStage::RuleBased => Self::RuleBased,
            RejectionStage::Semantic => Self::Llm,
        }
    }
}

/// The outcome of resolving one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    valid: bool,
    source: Source,
    summary: String,
    links: Vec<SourceLink>,
}

impl QueryResult {
    /// A rejection by the given stage.
    pub fn rejected(stage: RejectionStage) -> Self {
        let summary = match stage {
            RejectionStage::RuleBased => RULE_REJECTION,
            RejectionStage::Semantic => SEMANTIC_REJECTION,
        };
        Self {
            valid: false,
            source: stage.into(),
            summary: summary.to_string(),
            links: Vec::new(),
        }
    }

    /// A summary reused from memory. No pages were scraped, so there are no links.
    pub fn from_memory(summary: impl Into<String>) -> Self {
        Self {
            valid: true,
            source: Source::Memory,
            summary: summary.into(),
            links: Vec::new(),
        }
    }

    /// A newly produced summary and the pages it was built from.
    pub fn fresh(summary: impl Into<String>, links: Vec<SourceLink>) -> Self {
        Self {
            valid: true,
            source: Source::Fresh,
            summary: summary.into(),
            links,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn links(&self) -> &[SourceLink] {
        &self.links
    }
}

/// The one failure a caller of [`Pipeline::resolve`](super::Pipeline::resolve) sees.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The query was valid but no page yielded usable content.
    #[error("Failed to extract usable content for query: {query}")]
    RetrievalExhausted { query: String },
}

/// Resolution stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RuleCheck,
    LlmCheck,
    MemoryCheck,
    Retrieve,
    Summarize,
    Store,
    Done,
    Rejected,
}

impl From<RejectionStage> for Stage {
    /// The check that produced the rejection.
    fn from(stage: RejectionStage) -> Self {
        match stage {
            RejectionStage::RuleBased => Self::RuleCheck,
            RejectionStage::Semantic => Self::LlmCheck,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RuleCheck => "rule_check",
            Self::LlmCheck => "llm_check",
            Self::MemoryCheck => "memory_check",
            Self::Retrieve => "retrieve",
            Self::Summarize => "summarize",
            Self::Store => "store",
            Self::Done => "done",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejection_maps_to_deciding_stage() {
        assert_eq!(Stage::from(RejectionStage::RuleBased), Stage::RuleCheck);
        assert_eq!(Stage::from(RejectionStage::Semantic), Stage::LlmCheck);
        assert_eq!(Stage::from(RejectionStage::Semantic).to_string(), "llm_check");
    }

    #[test]
    fn source_wire_names() {
        for (source, name) in [
            (Source::RuleBased, "rule-based"),
            (Source::Llm, "llm"),
            (Source::Memory, "memory"),
            (Source::Fresh, "fresh"),
        ] {
            assert_eq!(serde_json::to_value(source).unwrap(), json!(name));
            assert_eq!(source.to_string(), name);
        }
    }

    #[test]
    fn rejections_name_their_stage() {
        let rule = QueryResult::rejected(RejectionStage::RuleBased);
        assert!(!rule.is_valid());
        assert_eq!(rule.source(), Source::RuleBased);
        assert_eq!(rule.summary(), RULE_REJECTION);

        let llm = QueryResult::rejected(RejectionStage::Semantic);
        assert_eq!(llm.source(), Source::Llm);
        assert_eq!(llm.summary(), SEMANTIC_REJECTION);
    }

    #[test]
    fn result_serializes_to_wire_shape() {
        let result = QueryResult::fresh(
            "answer",
            vec![SourceLink {
                title: "T".to_string(),
                url: "https://example.com".to_string(),
                snippet: "S".to_string(),
            }],
        );
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "valid": true,
                "source": "fresh",
                "summary": "answer",
                "links": [{"title": "T", "url": "https://example.com", "snippet": "S"}]
            })
        );
    }

    #[test]
    fn memory_result_has_no_links() {
        let result = QueryResult::from_memory("cached");
        assert!(result.is_valid());
        assert!(result.links().is_empty());
        assert_eq!(result.source(), Source::Memory);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::MemoryCheck.to_string(), "memory_check");
    }
}
