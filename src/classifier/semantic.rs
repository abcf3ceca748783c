use std::sync::Arc;

use tracing::{debug, warn};

use crate::llm::{GenerativeModel, ModelError, Prompt};

/// System instruction for the semantic check. The model must answer with the
/// single word "Valid" or "Invalid".
pub const CLASSIFIER_INSTRUCTION: &str = r#"You are a query classifier. Determine if the user's input is a valid web search query.

A query is VALID if it can reasonably be answered using a web search engine.

Examples of VALID queries:
- "Best laptop to buy in 2025"
- "Symptoms of COVID-19"
- "How to fix a leaking faucet"
- "Weather in Tokyo tomorrow"

A query is INVALID if:
- It is a personal task, reminder or command (e.g., "Buy milk", "Set an alarm", "Call mom")
- It is vague or nonsensical (e.g., "Tell me something", "123abc !@#")

Respond ONLY with "Valid" or "Invalid"."#;

const CLASSIFIER_TEMPERATURE: f32 = 0.2;

/// What the classifier reports when the model call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Treat the query as valid.
    #[default]
    Open,
    /// Treat the query as invalid.
    Closed,
}

/// Asks a language model whether a query is answerable by web search.
pub struct SemanticClassifier {
    model: Arc<dyn GenerativeModel>,
    policy: FailurePolicy,
}

impl SemanticClassifier {
    pub fn new(model: Arc<dyn GenerativeModel>, policy: FailurePolicy) -> Self {
        Self { model, policy }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Makes a single model call and interprets the answer.
    pub fn check(&self, query: &str) -> Result<bool, ModelError> {
        let prompt = Prompt::new(query)
            .system(CLASSIFIER_INSTRUCTION)
            .temperature(CLASSIFIER_TEMPERATURE);
        let answer = self.model.generate(&prompt)?;
        debug!(model = self.model.model(), answer = answer.trim(), "semantic classification");
        Ok(is_valid_answer(&answer))
    }

    /// Like [`check`](Self::check), but a failed call resolves to the
    /// configured [`FailurePolicy`].
    pub fn is_valid(&self, query: &str) -> bool {
        match self.check(query) {
            Ok(valid) => valid,
            Err(e) => {
                let valid = self.policy == FailurePolicy::Open;
                warn!(
                    model = self.model.model(),
                    error = %e,
                    assumed_valid = valid,
                    "semantic classification failed"
                );
                valid
            }
        }
    }
}

fn is_valid_answer(answer: &str) -> bool {
    answer
        .trim()
        .trim_matches(|c: char| c == '.' || c == '"' || c == '\'')
        .eq_ignore_ascii_case("valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(Result<&'static str, u16>);

    impl GenerativeModel for FixedModel {
        fn generate(&self, prompt: &Prompt) -> Result<String, ModelError> {
            assert_eq!(prompt.system_text(), Some(CLASSIFIER_INSTRUCTION));
            match self.0 {
                Ok(answer) => Ok(answer.to_string()),
                Err(status) => Err(ModelError::Http { status }),
            }
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    fn classifier(answer: Result<&'static str, u16>, policy: FailurePolicy) -> SemanticClassifier {
        SemanticClassifier::new(Arc::new(FixedModel(answer)), policy)
    }

    #[test]
    fn valid_answer_passes() {
        assert!(classifier(Ok("Valid"), FailurePolicy::Open).is_valid("q"));
        assert!(classifier(Ok("  valid.\n"), FailurePolicy::Open).is_valid("q"));
    }

    #[test]
    fn invalid_answer_fails() {
        assert!(!classifier(Ok("Invalid"), FailurePolicy::Open).is_valid("q"));
    }

    #[test]
    fn unexpected_answer_fails() {
        assert!(!classifier(Ok("Valid query, probably"), FailurePolicy::Open).is_valid("q"));
    }

    #[test]
    fn failure_is_valid_when_open() {
        let classifier = classifier(Err(503), FailurePolicy::Open);
        assert!(classifier.check("q").is_err());
        assert!(classifier.is_valid("q"));
    }

    #[test]
    fn failure_is_invalid_when_closed() {
        assert!(!classifier(Err(503), FailurePolicy::Closed).is_valid("q"));
    }

    #[test]
    fn default_policy_is_open() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::Open);
    }
}
