//! Health checks for the `doctor` command.
//!
//! Reports configuration, the memory database and the local model server.

use std::path::Path;

use anyhow::Result;

use crate::config::{Config, ConfigError};
use crate::llm::OllamaClient;
use crate::memory::MemoryStore;

// ANSI color codes for terminal output
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Health status for a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Component is healthy
    Ok,
    /// Component has a warning but is functional
    Warning(String),
    /// Component is not functional
    Error(String),
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, HealthStatus::Ok)
    }
}

/// Configuration health information.
#[derive(Debug)]
pub struct ConfigHealth {
    pub status: HealthStatus,
    pub summary_model: Option<String>,
    pub fallback_model: Option<String>,
}

/// Database health information.
#[derive(Debug)]
pub struct DatabaseHealth {
    pub status: HealthStatus,
    pub file_path: String,
    pub schema_version: u32,
    pub records: i64,
}

/// Local model server connectivity information.
#[derive(Debug)]
pub struct OllamaHealth {
    pub status: HealthStatus,
    pub base_url: String,
    pub models: Vec<String>,
}

/// Performs all health checks and prints results.
///
/// `embedding_model` is the model the memory store needs; its absence from
/// the server is reported as a warning.
pub fn run_health_checks(
    config: &Result<Config, ConfigError>,
    db_path: &Path,
    memory: &MemoryStore,
    ollama: &OllamaClient,
    embedding_model: &str,
) -> Result<()> {
    let config_health = check_config(config);
    let db_health = check_database_health(db_path, memory)?;
    let ollama_health = check_ollama_health(ollama, embedding_model);

    print_health_report(&config_health, &db_health, &ollama_health);

    Ok(())
}

fn check_config(config: &Result<Config, ConfigError>) -> ConfigHealth {
    match config {
        Ok(config) => ConfigHealth {
            status: HealthStatus::Ok,
            summary_model: Some(config.llm_model.clone()),
            fallback_model: config.fallback_model.clone(),
        },
        Err(e) => ConfigHealth {
            status: HealthStatus::Error(e.to_string()),
            summary_model: None,
            fallback_model: None,
        },
    }
}

fn check_database_health(db_path: &Path, memory: &MemoryStore) -> Result<DatabaseHealth> {
    let db = memory.database()?;
    let status = match db.connection().query_row("SELECT 1", [], |_| Ok(())) {
        Ok(_) => HealthStatus::Ok,
        Err(e) => HealthStatus::Error(format!("Connection test failed: {}", e)),
    };
    let schema_version = db.schema_version()?;
    drop(db);

    Ok(DatabaseHealth {
        status,
        file_path: db_path.display().to_string(),
        schema_version,
        records: memory.count()?,
    })
}

fn check_ollama_health(client: &OllamaClient, embedding_model: &str) -> OllamaHealth {
    let base_url = client.base_url().to_string();

    match client.list_models() {
        Ok(models) => OllamaHealth {
            status: model_status(&models, embedding_model),
            base_url,
            models,
        },
        Err(e) => OllamaHealth {
            status: HealthStatus::Error(format!("Connection failed: {}", e)),
            base_url,
            models: Vec::new(),
        },
    }
}

/// Installed model names carry a tag (`all-minilm:latest`); a bare name
/// matches any tag.
fn model_status(models: &[String], wanted: &str) -> HealthStatus {
    if models.is_empty() {
        return HealthStatus::Warning("No models installed".to_string());
    }
    let installed = models
        .iter()
        .any(|m| m == wanted || m.split(':').next() == Some(wanted));
    if installed {
        HealthStatus::Ok
    } else {
        HealthStatus::Warning(format!("Embedding model '{}' not installed", wanted))
    }
}

fn status_symbol(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => "\u{2713}",
        HealthStatus::Warning(_) => "!",
        HealthStatus::Error(_) => "\u{2717}",
    }
}

fn status_color(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => GREEN,
        HealthStatus::Warning(_) => YELLOW,
        HealthStatus::Error(_) => RED,
    }
}

fn status_text(status: &HealthStatus, ok: &str) -> String {
    match status {
        HealthStatus::Ok => ok.to_string(),
        HealthStatus::Warning(w) => w.clone(),
        HealthStatus::Error(e) => e.clone(),
    }
}

fn print_health_report(config: &ConfigHealth, db: &DatabaseHealth, ollama: &OllamaHealth) {
    println!("{}sift doctor{}", BOLD, RESET);
    println!();

    println!("{}Configuration{}", BOLD, RESET);
    println!(
        "  {}{}{} Environment: {}",
        status_color(&config.status),
        status_symbol(&config.status),
        RESET,
        status_text(&config.status, "OK")
    );
    if let Some(model) = &config.summary_model {
        println!("    {}Summary model: {}{}", DIM, model, RESET);
    }
    if let Some(model) = &config.fallback_model {
        println!("    {}Fallback model: {}{}", DIM, model, RESET);
    }
    println!();

    println!("{}Memory{}", BOLD, RESET);
    println!(
        "  {}{}{} Connection: {}",
        status_color(&db.status),
        status_symbol(&db.status),
        RESET,
        if db.status.is_ok() { "OK" } else { "FAILED" }
    );
    println!("    {}Path: {}{}", DIM, db.file_path, RESET);
    println!("    {}Schema: v{}{}", DIM, db.schema_version, RESET);
    println!("  Records:    {:>6}", db.records);
    println!();

    println!("{}Ollama{}", BOLD, RESET);
    println!(
        "  {}{}{} Status: {}",
        status_color(&ollama.status),
        status_symbol(&ollama.status),
        RESET,
        status_text(&ollama.status, "Connected")
    );
    if !ollama.base_url.is_empty() {
        println!("    {}URL: {}{}", DIM, ollama.base_url, RESET);
    }
    if !ollama.models.is_empty() {
        let models_display = if ollama.models.len() > 3 {
            format!(
                "{}, ... ({} more)",
                ollama.models[..3].join(", "),
                ollama.models.len() - 3
            )
        } else {
            ollama.models.join(", ")
        };
        println!("    {}Models: {}{}", DIM, models_display, RESET);
    }
}
