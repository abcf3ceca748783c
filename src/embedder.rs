//! Text embedding capability and vector similarity.

use crate::llm::{ModelError, OllamaClient};

/// Turns text into a fixed-length vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError>;
}

/// Embeds text with a model served by a local Ollama instance.
#[derive(Debug)]
pub struct OllamaEmbedder {
    client: OllamaClient,
}

impl OllamaEmbedder {
    /// Wraps a client whose configured model is an embedding model.
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        self.client.embed(text)
    }
}

/// Cosine similarity of two vectors.
///
/// Returns `None` when the vectors differ in length, are empty, either has
/// zero magnitude, or a component is not finite.
///
/// # Examples
///
/// ```
/// use sift::embedder::cosine_similarity;
///
/// let score = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap();
/// assert!((score - 1.0).abs() < 1e-6);
/// assert!(cosine_similarity(&[1.0], &[1.0, 2.0]).is_none());
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !score.is_finite() {
        return None;
    }
    Some(score.clamp(-1.0, 1.0) as f32)
}
