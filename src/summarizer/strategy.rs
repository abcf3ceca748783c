use std::sync::Arc;

use crate::llm::{GenerativeModel, ModelError, Prompt};

/// Maximum characters of prompt text handed to the local fallback model.
pub const LOCAL_INPUT_CHARS: usize = 4000;

/// Output cap for the local fallback model, in tokens.
pub const LOCAL_MAX_TOKENS: u32 = 256;

/// One way of turning a prompt into a summary.
pub trait SummaryStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn summarize(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Primary strategy: the full prompt goes to a hosted model.
pub struct HostedSummary {
    model: Arc<dyn GenerativeModel>,
}

impl HostedSummary {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }
}

impl SummaryStrategy for HostedSummary {
    fn name(&self) -> &str {
        self.model.model()
    }

    fn summarize(&self, prompt: &str) -> Result<String, ModelError> {
        let answer = self.model.generate(&Prompt::new(prompt))?;
        Ok(answer.trim().to_string())
    }
}

/// Fallback strategy: a bounded, deterministic run on a local model.
///
/// The input is clipped to [`LOCAL_INPUT_CHARS`] and decoding uses
/// temperature 0 so repeated runs produce the same summary.
pub struct LocalSummary {
    model: Arc<dyn GenerativeModel>,
}

impl LocalSummary {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }
}

impl SummaryStrategy for LocalSummary {
    fn name(&self) -> &str {
        self.model.model()
    }

    fn summarize(&self, prompt: &str) -> Result<String, ModelError> {
        let clipped: String = prompt.chars().take(LOCAL_INPUT_CHARS).collect();
        let request = Prompt::new(clipped)
            .max_tokens(LOCAL_MAX_TOKENS)
            .temperature(0.0);
        let answer = self.model.generate(&request)?;
        Ok(answer.trim().to_string())
    }
}
