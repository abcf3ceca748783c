//! Client for hosted OpenAI-compatible chat-completions endpoints.
use std::time::Duration;

use serde_json::{Value, json};

use super::{GenerativeModel, ModelError, Prompt};

/// Builder for constructing `ChatClient` instances.
///
/// # Examples
///
/// ```
/// use sift::llm::ChatClientBuilder;
///
/// let client = ChatClientBuilder::new()
///     .base_url("https://llm.example.com")
///     .api_key("secret")
///     .model("general-8b")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.endpoint(), "https://llm.example.com/v1/chat/completions");
/// ```
#[derive(Default)]
pub struct ChatClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
}

impl ChatClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL; `/v1/chat/completions` is appended.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the bearer credential.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the per-request timeout. Defaults to 60 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// Fails with `InvalidUrl` when the base URL is missing or malformed and
    /// with `Api` when no model name was given.
    pub fn build(self) -> Result<ChatClient, ModelError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ModelError::InvalidUrl("base URL not set".to_string()))?;
        let base_url = base_url.trim_end_matches('/');
        reqwest::Url::parse(base_url)
            .map_err(|e| ModelError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| ModelError::api("model name not set"))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(60)))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(ModelError::Network)?;

        Ok(ChatClient {
            client,
            endpoint: format!("{}/v1/chat/completions", base_url),
            api_key: self.api_key,
            model,
        })
    }
}

/// Synchronous client for a hosted chat-completions model.
pub struct ChatClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ChatClient {
    /// Returns the full completions URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, prompt: &Prompt) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = prompt.system_text() {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt.user()}));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(temperature) = prompt.sampling_temperature() {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = prompt.max_token_limit() {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }
}

impl GenerativeModel for ChatClient {
    fn generate(&self, prompt: &Prompt) -> Result<String, ModelError> {
        let mut request = self.client.post(&self.endpoint).json(&self.request_body(prompt));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(ModelError::transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(ModelError::transport)?;
        let json: Value = serde_json::from_str(&body).map_err(ModelError::Serialization)?;
        parse_chat_response(&json)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Extracts `choices[0].message.content`.
fn parse_chat_response(json: &Value) -> Result<String, ModelError> {
    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Err(ModelError::api(message));
    }

    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ModelError::api("Missing 'choices[0].message.content' in API response"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ChatClient {
        ChatClientBuilder::new()
            .base_url("https://llm.example.com/")
            .api_key("secret")
            .model("general-8b")
            .build()
            .unwrap()
    }

    #[test]
    fn build_requires_base_url() {
        let result = ChatClientBuilder::new().model("m").build();
        assert!(matches!(result, Err(ModelError::InvalidUrl(_))));
    }

    #[test]
    fn build_rejects_malformed_url() {
        let result = ChatClientBuilder::new()
            .base_url("not a url")
            .model("m")
            .build();
        assert!(matches!(result, Err(ModelError::InvalidUrl(_))));
    }

    #[test]
    fn build_requires_model() {
        let result = ChatClientBuilder::new()
            .base_url("https://llm.example.com")
            .model("  ")
            .build();
        assert!(matches!(result, Err(ModelError::Api { .. })));
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        assert_eq!(client().endpoint(), "https://llm.example.com/v1/chat/completions");
    }

    #[test]
    fn debug_output_redacts_key() {
        let debug = format!("{:?}", client());
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn request_body_orders_system_before_user() {
        let prompt = Prompt::new("best laptop 2025")
            .system("You are a query classifier.")
            .temperature(0.2);
        let body = client().request_body(&prompt);

        assert_eq!(body["model"], "general-8b");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "best laptop 2025");
        assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn request_body_without_system_has_single_message() {
        let body = client().request_body(&Prompt::new("hello").max_tokens(32));
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["max_tokens"], 32);
    }

    #[test]
    fn parses_first_choice() {
        let json = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "Valid"}},
                {"message": {"role": "assistant", "content": "Invalid"}}
            ]
        });
        assert_eq!(parse_chat_response(&json).unwrap(), "Valid");
    }

    #[test]
    fn missing_choices_is_api_error() {
        assert!(matches!(
            parse_chat_response(&json!({"choices": []})),
            Err(ModelError::Api { .. })
        ));
    }

    #[test]
    fn error_payload_is_surfaced() {
        let json = json!({"error": {"message": "rate limited", "type": "requests"}});
        let err = parse_chat_response(&json).unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }
}
