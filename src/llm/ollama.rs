//! Client for a local Ollama model server.
//!
//! Serves two roles: the fallback summarization model (`/api/generate`) and
//! the embedding model (`/api/embed`).
use std::time::Duration;

use serde_json::{Value, json};

use super::{GenerativeModel, ModelError, Prompt, retry_with_backoff};

/// Base URL used when neither the builder nor `OLLAMA_HOST` provide one.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Seed forwarded with every generation so repeated calls decode identically.
const GENERATION_SEED: u64 = 42;

/// Backoff schedule for embedding calls. The server refuses connections or
/// answers 5xx while it loads a model into memory.
const EMBED_RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// Builder for constructing `OllamaClient` instances.
///
/// # Examples
///
/// ```
/// use sift::llm::OllamaClientBuilder;
///
/// let client = OllamaClientBuilder::new()
///     .base_url("http://localhost:11434")
///     .model("all-minilm")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.model(), "all-minilm");
/// ```
#[derive(Debug, Default)]
pub struct OllamaClientBuilder {
    base_url: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
}

impl OllamaClientBuilder {
    /// Creates a new `OllamaClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the Ollama API (e.g., "http://localhost:11434").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model name used for generation or embedding.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the per-request timeout. Defaults to 60 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `OllamaClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// If `base_url()` was not called, `OLLAMA_HOST` is used, falling back to
    /// [`DEFAULT_OLLAMA_HOST`]. If `model()` was not called, `OLLAMA_MODEL` is
    /// used, falling back to an empty string.
    pub fn build(self) -> Result<OllamaClient, ModelError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string()),
        };
        let base_url = base_url.trim_end_matches('/').to_string();

        let model = match self.model {
            Some(m) => m,
            None => std::env::var("OLLAMA_MODEL").unwrap_or_default(),
        };

        reqwest::Url::parse(&base_url)
            .map_err(|e| ModelError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(60)))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(ModelError::Network)?;

        Ok(OllamaClient {
            client,
            base_url,
            model,
        })
    }
}

/// Synchronous HTTP client for a local Ollama server.
///
/// Construct with [`OllamaClientBuilder`].
pub struct OllamaClient {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OllamaClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model name configured for this client.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Lists installed models, largest first.
    pub fn list_models(&self) -> Result<Vec<String>, ModelError> {
        let url = format!("{}/api/tags", self.base_url);
        let json = self.send(self.client.get(&url))?;

        let mut models: Vec<(String, u64)> = json
            .get("models")
            .and_then(|m| m.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|model| {
                        let name = model.get("name").and_then(|n| n.as_str())?;
                        let size = model.get("size").and_then(|s| s.as_u64()).unwrap_or(0);
                        Some((name.to_string(), size))
                    })
                    .collect()
            })
            .unwrap_or_default();

        models.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(models.into_iter().map(|(name, _)| name).collect())
    }

    /// Embeds `text` with the configured model.
    ///
    /// Transient failures are retried with backoff while the server warms up.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let url = format!("{}/api/embed", self.base_url);
        let body = json!({
            "model": self.model,
            "input": text,
        });

        retry_with_backoff(&EMBED_RETRY_DELAYS, || {
            let json = self.send(self.client.post(&url).json(&body))?;
            parse_embed_response(&json)
        })
    }

    fn generate_request(&self, prompt: &Prompt) -> Value {
        let mut options = serde_json::Map::new();
        options.insert("seed".to_string(), json!(GENERATION_SEED));
        if let Some(max_tokens) = prompt.max_token_limit() {
            options.insert("num_predict".to_string(), json!(max_tokens));
        }
        if let Some(temperature) = prompt.sampling_temperature() {
            options.insert("temperature".to_string(), json!(temperature));
        }

        let mut body = json!({
            "model": self.model,
            "prompt": prompt.user(),
            "stream": false,
            "options": options,
        });
        if let Some(system) = prompt.system_text() {
            body["system"] = json!(system);
        }
        body
    }

    fn send(&self, request: reqwest::blocking::RequestBuilder) -> Result<Value, ModelError> {
        let response = request.send().map_err(ModelError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(ModelError::transport)?;
        serde_json::from_str(&body).map_err(ModelError::Serialization)
    }
}

impl GenerativeModel for OllamaClient {
    fn generate(&self, prompt: &Prompt) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = self.generate_request(prompt);
        let json = self.send(self.client.post(&url).json(&body))?;
        parse_generate_response(&json)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Extracts the `response` field of a non-streaming `/api/generate` reply.
fn parse_generate_response(json: &Value) -> Result<String, ModelError> {
    if let Some(error) = json.get("error").and_then(|e| e.as_str()) {
        return Err(ModelError::api(error));
    }

    json.get("response")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ModelError::api("Missing 'response' field in API response"))
}

/// Extracts the first vector of an `/api/embed` reply.
fn parse_embed_response(json: &Value) -> Result<Vec<f32>, ModelError> {
    let vector = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .and_then(|vectors| vectors.first())
        .and_then(|v| v.as_array())
        .ok_or_else(|| ModelError::api("Missing 'embeddings' field in API response"))?;

    vector
        .iter()
        .map(|x| {
            x.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| ModelError::api("Non-numeric value in embedding"))
        })
        .collect()
}
