/// A single-turn request to a generative model.
///
/// # Examples
///
/// ```
/// use sift::llm::Prompt;
///
/// let prompt = Prompt::new("Is the sky blue?")
///     .system("Answer yes or no.")
///     .temperature(0.0);
/// assert_eq!(prompt.user(), "Is the sky blue?");
/// assert_eq!(prompt.system_text(), Some("Answer yes or no."));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    system: Option<String>,
    user: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl Prompt {
    /// Creates a prompt carrying only user content.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Sets the system instruction.
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Caps the number of generated tokens.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn system_text(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn max_token_limit(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn sampling_temperature(&self) -> Option<f32> {
        self.temperature
    }
}
