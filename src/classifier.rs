//! Two-stage query validation.
//!
//! A cheap syntactic filter rejects task-like commands ("buy milk", "call mom")
//! before the semantic filter asks a language model whether the query can be
//! answered by a web search.
mod rules;
mod semantic;

pub use rules::{COMMAND_PREFIXES, RuleFilter};
pub use semantic::{CLASSIFIER_INSTRUCTION, FailurePolicy, SemanticClassifier};

/// The stage that rejected a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionStage {
    RuleBased,
    Semantic,
}

/// Outcome of [`QueryClassifier::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Rejected(RejectionStage),
}

impl Verdict {
    pub fn is_valid(self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

/// Runs the rule filter, then the semantic classifier, stopping at the first
/// rejection.
pub struct QueryClassifier {
    rules: RuleFilter,
    semantic: SemanticClassifier,
}

impl QueryClassifier {
    pub fn new(rules: RuleFilter, semantic: SemanticClassifier) -> Self {
        Self { rules, semantic }
    }

    pub fn rules(&self) -> &RuleFilter {
        &self.rules
    }

    pub fn semantic(&self) -> &SemanticClassifier {
        &self.semantic
    }

    /// Classifies `query`. The semantic stage is never consulted for a query
    /// the rule filter rejects.
    pub fn validate(&self, query: &str) -> Verdict {
        if !self.rules.is_valid(query) {
            return Verdict::Rejected(RejectionStage::RuleBased);
        }
        if !self.semantic.is_valid(query) {
            return Verdict::Rejected(RejectionStage::Semantic);
        }
        Verdict::Valid
    }

    pub fn is_valid(&self, query: &str) -> bool {
        self.validate(query).is_valid()
    }
}
