use thiserror::Error;

/// Errors that can occur when calling a model endpoint.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The endpoint answered but the payload was not usable
    #[error("Model API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ModelError {
    /// Classifies a transport error, separating timeouts from other failures.
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Network(err)
        }
    }

    /// Shorthand for an unusable response payload.
    pub(crate) fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Returns `true` for errors that may succeed on a later attempt
    /// (network failures, timeouts and HTTP 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Network(_) | ModelError::Timeout(_) => true,
            ModelError::Http { status } => (500..600).contains(status),
            ModelError::Serialization(_) | ModelError::Api { .. } | ModelError::InvalidUrl(_) => {
                false
            }
        }
    }
}
