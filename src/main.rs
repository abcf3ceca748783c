use std::io::{self, BufRead, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sift::config::{Config, ConfigError};
use sift::embedder::OllamaEmbedder;
use sift::llm::OllamaClientBuilder;
use sift::memory::MemoryStore;
use sift::pipeline::{Pipeline, PipelineError, QueryResult};
use sift::utils::{ensure_database_directory, get_database_path, truncate_chars};
use sift::{Database, bootstrap, doctor, server};
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// sift - answer questions from the web, remembering what it already found
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Answer questions by searching the web and summarizing the results")]
#[command(version)]
struct Cli {
    /// Memory database file (overrides SIFT_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Cosine similarity needed to reuse a stored answer (0.0 to 1.0)
    #[arg(long, global = true, value_name = "F")]
    threshold: Option<f32>,

    /// Number of search results to scrape (1 to 10)
    #[arg(long, global = true, value_name = "N")]
    results: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Answer a single query
    Ask(AskCommand),
    /// Prompt for queries until EOF or an empty line
    Interactive,
    /// Serve the HTTP API
    Serve(ServeCommand),
    /// List stored answers, newest first
    History(HistoryCommand),
    /// Check configuration, memory and the local model server
    Doctor,
}

#[derive(Parser)]
struct AskCommand {
    /// The question to answer
    #[arg(value_name = "QUERY")]
    query: String,
}

#[derive(Parser)]
struct ServeCommand {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[derive(Parser)]
struct HistoryCommand {
    /// Maximum number of records to show
    #[arg(short = 'n', long, default_value_t = 20)]
    limit: usize,
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Ask(cmd) => handle_ask(&cli, cmd),
        Commands::Interactive => handle_interactive(&cli),
        Commands::Serve(cmd) => handle_serve(&cli, cmd),
        Commands::History(cmd) => handle_history(&cli, cmd),
        Commands::Doctor => handle_doctor(&cli),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Logs go to stderr so stdout carries only answers.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// User errors are bad input or missing configuration. Everything else,
/// including retrieval failure, is internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.downcast_ref::<ConfigError>().is_some() || error.to_string().contains("cannot be empty")
}

/// Reads configuration and applies command-line overrides.
fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = Config::from_env()?;
    if let Some(threshold) = cli.threshold {
        config = config.with_threshold(threshold)?;
    }
    if let Some(results) = cli.results {
        config = config.with_search_results(results)?;
    }
    if let Some(db) = &cli.db {
        config = config.with_db_path(db.clone());
    }
    Ok(config)
}

/// Database path precedence: `--db`, then `SIFT_DB_PATH`, then the data dir.
fn resolve_db_path(cli: &Cli, config: Option<&Config>) -> Result<PathBuf> {
    if let Some(path) = &cli.db {
        return Ok(path.clone());
    }
    if let Some(path) = config.and_then(|c| c.db_path.clone()) {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os("SIFT_DB_PATH").filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    get_database_path()
}

fn open_database(path: &Path) -> Result<Database> {
    ensure_database_directory(path)?;
    Database::open(path).with_context(|| format!("Failed to open database: {}", path.display()))
}

fn open_pipeline(cli: &Cli) -> Result<Pipeline> {
    let config = load_config(cli)?;
    let db_path = resolve_db_path(cli, Some(&config))?;
    let db = open_database(&db_path)?;
    bootstrap::build_pipeline(&config, db)
}

/// A memory store for read-only commands. The embedder is never called.
fn open_memory(cli: &Cli, config: Option<&Config>) -> Result<(PathBuf, MemoryStore)> {
    let db_path = resolve_db_path(cli, config)?;
    let db = open_database(&db_path)?;

    let mut builder = OllamaClientBuilder::new();
    if let Some(config) = config {
        builder = builder
            .base_url(&config.ollama_host)
            .model(&config.embedding_model);
    }
    let embedder = OllamaEmbedder::new(builder.build()?);
    let threshold = config.map_or(sift::memory::DEFAULT_SIMILARITY_THRESHOLD, |c| {
        c.similarity_threshold
    });

    Ok((db_path, MemoryStore::new(db, Arc::new(embedder), threshold)))
}

fn handle_ask(cli: &Cli, cmd: &AskCommand) -> Result<()> {
    if cmd.query.trim().is_empty() {
        anyhow::bail!("Query cannot be empty");
    }

    let pipeline = open_pipeline(cli)?;
    let result = pipeline.resolve(&cmd.query)?;
    print_result(&result);
    Ok(())
}

fn handle_interactive(cli: &Cli) -> Result<()> {
    let pipeline = open_pipeline(cli)?;
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("Enter your query: ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            break;
        }

        match pipeline.resolve(query) {
            Ok(result) => print_result(&result),
            Err(e @ PipelineError::RetrievalExhausted { .. }) => eprintln!("Error: {e}"),
        }
        println!();
    }

    Ok(())
}

fn handle_serve(cli: &Cli, cmd: &ServeCommand) -> Result<()> {
    let addr: SocketAddr = (cmd.host.as_str(), cmd.port)
        .to_socket_addrs()
        .with_context(|| format!("Invalid listen address {}:{}", cmd.host, cmd.port))?
        .next()
        .with_context(|| format!("No address found for {}", cmd.host))?;

    // Blocking HTTP clients must be created and dropped outside the runtime.
    let pipeline = Arc::new(open_pipeline(cli)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let result = runtime.block_on(server::serve(Arc::clone(&pipeline), addr));
    drop(runtime);
    drop(pipeline);
    result
}

fn handle_history(cli: &Cli, cmd: &HistoryCommand) -> Result<()> {
    let config = Config::from_env().ok();
    let (_, memory) = open_memory(cli, config.as_ref())?;
    let records = memory.records(cmd.limit)?;

    if records.is_empty() {
        println!("No stored answers.");
        return Ok(());
    }

    for record in &records {
        let when = record
            .updated_at()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "?".to_string());
        println!("{}  {}", when, record.query());
        println!("    {}", truncate_chars(&record.summary().replace('\n', " "), 100));
    }

    Ok(())
}

fn handle_doctor(cli: &Cli) -> Result<()> {
    let config = load_config(cli);
    let (db_path, memory) = open_memory(cli, config.as_ref().ok())?;

    let ollama = match &config {
        Ok(config) => OllamaClientBuilder::new().base_url(&config.ollama_host),
        Err(_) => OllamaClientBuilder::new(),
    }
    .build()?;
    let embedding_model = config
        .as_ref()
        .map(|c| c.embedding_model.clone())
        .unwrap_or_else(|_| sift::config::DEFAULT_EMBEDDING_MODEL.to_string());

    doctor::run_health_checks(&config, &db_path, &memory, &ollama, &embedding_model)
}

fn print_result(result: &QueryResult) {
    if !result.is_valid() {
        println!("{}", result.summary());
        return;
    }

    println!("Answer ({})", result.source());
    println!("{}", "-".repeat(40));
    println!("{}", result.summary());

    if !result.links().is_empty() {
        println!();
        println!("Sources");
        for (i, link) in result.links().iter().enumerate() {
            println!("  {}. {}", i + 1, link.title);
            println!("     {}", link.url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_apply_to_subcommands() {
        let cli = Cli::try_parse_from([
            "sift", "ask", "best laptop 2025", "--threshold", "0.9", "--results", "3",
        ])
        .unwrap();
        assert_eq!(cli.threshold, Some(0.9));
        assert_eq!(cli.results, Some(3));
        assert!(matches!(cli.command, Commands::Ask(ref cmd) if cmd.query == "best laptop 2025"));
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["sift", "serve"]).unwrap();
        let Commands::Serve(cmd) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(cmd.host, "127.0.0.1");
        assert_eq!(cmd.port, 8000);
    }

    #[test]
    fn db_flag_takes_precedence() {
        let cli = Cli::try_parse_from(["sift", "--db", "/tmp/custom.db", "history"]).unwrap();
        assert_eq!(
            resolve_db_path(&cli, None).unwrap(),
            PathBuf::from("/tmp/custom.db")
        );
    }

    #[test]
    fn empty_query_is_a_user_error() {
        let cli = Cli::try_parse_from(["sift", "ask", "   "]).unwrap();
        let Commands::Ask(cmd) = &cli.command else {
            panic!("expected ask");
        };
        let err = handle_ask(&cli, cmd).unwrap_err();
        assert!(is_user_error(&err));
    }

    #[test]
    fn config_errors_are_user_errors() {
        let err = anyhow::Error::new(ConfigError::Missing(vec!["LLM_API_KEY".to_string()]));
        assert!(is_user_error(&err));
        assert!(!is_user_error(&anyhow::anyhow!("disk full")));
    }
}
