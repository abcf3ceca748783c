//! Generative and embedding model clients.
//!
//! Two HTTP clients are provided: `ChatClient` for hosted chat-completions
//! endpoints and `OllamaClient` for a local model server. Both implement
//! [`GenerativeModel`], the capability the classifier and summarizer depend on.
mod chat;
mod error;
mod ollama;
mod prompt;
mod retry;

pub use chat::{ChatClient, ChatClientBuilder};
pub use error::ModelError;
pub use ollama::{DEFAULT_OLLAMA_HOST, OllamaClient, OllamaClientBuilder};
pub use prompt::Prompt;
pub use retry::retry_with_backoff;

/// A text generation capability.
///
/// Implementations make exactly one attempt per call unless documented
/// otherwise; callers decide how a failure degrades.
pub trait GenerativeModel: Send + Sync {
    /// Generates a completion for the prompt.
    fn generate(&self, prompt: &Prompt) -> Result<String, ModelError>;

    /// Returns the model name, used in log output.
    fn model(&self) -> &str;
}
