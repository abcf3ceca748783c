pub mod bootstrap;
pub mod classifier;
pub mod config;
pub mod db;
pub mod doctor;
pub mod embedder;
pub mod llm;
pub mod memory;
pub mod pipeline;
pub mod retriever;
pub mod server;
pub mod summarizer;
pub mod utils;

pub use classifier::{QueryClassifier, Verdict};
pub use config::{Config, ConfigError};
pub use db::Database;
pub use memory::{MemoryMatch, MemoryRecord, MemoryStore};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineError, QueryResult, Source};
pub use retriever::{Retriever, ScrapedContent, SourceLink};
pub use summarizer::{SUMMARY_FAILED, Summarizer};
