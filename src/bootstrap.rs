//! Builds a [`Pipeline`] from [`Config`].
//!
//! Every long-lived resource (HTTP clients, the embedder, the database) is
//! constructed here once and handed to the pipeline.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::classifier::{FailurePolicy, QueryClassifier, RuleFilter, SemanticClassifier};
use crate::config::Config;
use crate::embedder::OllamaEmbedder;
use crate::llm::{ChatClientBuilder, GenerativeModel, OllamaClientBuilder};
use crate::memory::MemoryStore;
use crate::pipeline::Pipeline;
use crate::retriever::{HttpPageFetcher, HttpSearchProvider, Retriever};
use crate::summarizer::Summarizer;
use crate::Database;

/// Assembles the production pipeline over `db`.
///
/// # Errors
///
/// Returns an error if any client cannot be constructed from the
/// configuration (for example a malformed URL).
pub fn build_pipeline(config: &Config, db: Database) -> Result<Pipeline> {
    let hosted = |model: &str| {
        ChatClientBuilder::new()
            .base_url(&config.llm_api_url)
            .api_key(&config.llm_api_key)
            .model(model)
            .timeout(config.model_timeout)
            .build()
            .with_context(|| format!("Failed to create hosted model client for {model}"))
    };

    let summary_model: Arc<dyn GenerativeModel> = Arc::new(hosted(&config.llm_model)?);
    let classifier_model: Arc<dyn GenerativeModel> = Arc::new(hosted(&config.classifier_model)?);

    let fallback_model = match &config.fallback_model {
        Some(model) => {
            let client: Arc<dyn GenerativeModel> = Arc::new(
                OllamaClientBuilder::new()
                    .base_url(&config.ollama_host)
                    .model(model)
                    .timeout(config.model_timeout)
                    .build()
                    .context("Failed to create fallback model client")?,
            );
            Some(client)
        }
        None => None,
    };

    let embedder = OllamaEmbedder::new(
        OllamaClientBuilder::new()
            .base_url(&config.ollama_host)
            .model(&config.embedding_model)
            .timeout(config.model_timeout)
            .build()
            .context("Failed to create embedding client")?,
    );

    let search = HttpSearchProvider::new(
        &config.search_api_url,
        &config.search_api_key,
        config.search_engine_id.clone(),
        config.page_timeout,
    )
    .context("Failed to create search client")?;
    let fetcher =
        HttpPageFetcher::new(config.page_timeout).context("Failed to create page fetcher")?;

    info!(
        model = %config.llm_model,
        classifier = %config.classifier_model,
        fallback = config.fallback_model.as_deref().unwrap_or("none"),
        embedding = %config.embedding_model,
        "pipeline configured"
    );

    Ok(Pipeline::builder()
        .classifier(QueryClassifier::new(
            RuleFilter::new(),
            SemanticClassifier::new(classifier_model, FailurePolicy::Open),
        ))
        .memory(MemoryStore::new(
            db,
            Arc::new(embedder),
            config.similarity_threshold,
        ))
        .retriever(Retriever::new(Arc::new(search), Arc::new(fetcher)))
        .summarizer(Summarizer::hosted_with_fallback(summary_model, fallback_model))
        .num_results(config.search_results)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_lookup(|name| {
            let value = match name {
                "LLM_API_URL" => "https://llm.example.com",
                "LLM_API_KEY" => "key",
                "LLM_MODEL" => "model",
                "SEARCH_API_URL" => "https://search.example.com/v1",
                "SEARCH_API_KEY" => "key",
                "SEARCH_RESULTS" => "3",
                _ => return None,
            };
            Some(value.to_string())
        })
        .unwrap()
    }

    #[test]
    fn builds_from_config() {
        let pipeline = build_pipeline(&config(), Database::in_memory().unwrap()).unwrap();
        assert_eq!(pipeline.num_results(), 3);
        assert_eq!(pipeline.memory().threshold(), 0.8);
    }

    #[test]
    fn bad_search_url_is_reported() {
        let mut config = config();
        config.search_api_url = "not a url".to_string();
        let Err(err) = build_pipeline(&config, Database::in_memory().unwrap()) else {
            panic!("expected an invalid search URL to be rejected");
        };
        assert!(err.to_string().contains("search client"));
    }
}
