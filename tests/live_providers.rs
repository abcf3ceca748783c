/// Tests against real model and search services.
///
/// Each test skips itself unless the services it needs are configured:
/// - `SIFT_LIVE_OLLAMA=1` with a reachable Ollama server (`OLLAMA_HOST`) and
///   an embedding model (`EMBEDDING_MODEL`, default `all-minilm`)
/// - the full environment read by `Config::from_env` for the pipeline test
///
/// ```bash
/// SIFT_LIVE_OLLAMA=1 cargo test --test live_providers -- --nocapture
/// ```
use sift::embedder::{Embedder, OllamaEmbedder, cosine_similarity};
use sift::llm::{GenerativeModel, OllamaClientBuilder, Prompt};
use sift::{Config, Database, Source, bootstrap};

fn live_ollama() -> bool {
    if std::env::var("SIFT_LIVE_OLLAMA").as_deref() != Ok("1") {
        println!("Skipping: SIFT_LIVE_OLLAMA not set");
        return false;
    }
    true
}

fn embedding_model() -> String {
    std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "all-minilm".to_string())
}

#[test]
fn embeddings_from_real_ollama_are_self_similar() {
    if !live_ollama() {
        return;
    }

    let client = OllamaClientBuilder::new()
        .model(embedding_model())
        .build()
        .expect("Failed to create Ollama client");
    let embedder = OllamaEmbedder::new(client);

    let a = embedder
        .embed("best laptop 2025")
        .expect("embedding should succeed against a running server");
    let b = embedder
        .embed("which laptop should I buy in 2025")
        .expect("embedding should succeed against a running server");
    let c = embedder
        .embed("symptoms of the flu")
        .expect("embedding should succeed against a running server");

    assert!(!a.is_empty());
    let same = cosine_similarity(&a, &a).unwrap();
    assert!((same - 1.0).abs() < 1e-4, "self similarity was {same}");

    let paraphrase = cosine_similarity(&a, &b).unwrap();
    let unrelated = cosine_similarity(&a, &c).unwrap();
    println!("paraphrase={paraphrase:.3} unrelated={unrelated:.3}");
    assert!(paraphrase > unrelated);
}

#[test]
fn generate_with_real_ollama_instance() {
    if !live_ollama() {
        return;
    }

    let client = OllamaClientBuilder::new()
        .build()
        .expect("Failed to create Ollama client");
    let model = match std::env::var("OLLAMA_MODEL") {
        Ok(model) => model,
        Err(_) => {
            let models = client.list_models().expect("Failed to list models");
            let Some(model) = models.into_iter().find(|m| !m.contains("minilm")) else {
                println!("Skipping: no generation model installed");
                return;
            };
            model
        }
    };
    let client = OllamaClientBuilder::new()
        .model(&model)
        .build()
        .expect("Failed to create Ollama client");

    let response = client
        .generate(&Prompt::new("Say hello in one word.").max_tokens(16))
        .unwrap_or_else(|e| panic!("Failed to generate with model '{model}': {e}"));
    assert!(!response.trim().is_empty());
}

#[test]
fn generate_handles_missing_ollama_gracefully() {
    let client = OllamaClientBuilder::new()
        .base_url("http://127.0.0.1:65535")
        .model("test-model")
        .build()
        .expect("Failed to create Ollama client");

    let error = client
        .generate(&Prompt::new("test prompt"))
        .expect_err("no server listens on this port");
    let message = error.to_string();
    assert!(
        message.contains("Network error") || message.contains("Request timed out"),
        "Expected network/timeout error, got: {message}"
    );
}

#[test]
fn full_pipeline_against_configured_providers() {
    let Ok(config) = Config::from_env() else {
        println!("Skipping: provider environment not configured");
        return;
    };
    if !live_ollama() {
        return;
    }

    let pipeline = bootstrap::build_pipeline(&config, Database::in_memory().unwrap())
        .expect("pipeline should build from a valid configuration");

    let rejected = pipeline.resolve("buy milk").unwrap();
    assert_eq!(rejected.source(), Source::RuleBased);

    let fresh = pipeline
        .resolve("What is the boiling point of water at sea level?")
        .expect("a factual query should retrieve content");
    assert_eq!(fresh.source(), Source::Fresh);
    assert!(!fresh.summary().is_empty());
    println!("{}", fresh.summary());

    let again = pipeline
        .resolve("What is the boiling point of water at sea level?")
        .unwrap();
    assert_eq!(again.source(), Source::Memory);
    assert_eq!(again.summary(), fresh.summary());
}
