//! Query memory: previously produced summaries keyed by query, matched by
//! embedding similarity.
mod record;
mod store;

pub use record::{MemoryMatch, MemoryRecord};
pub use store::{DEFAULT_SIMILARITY_THRESHOLD, MemoryStore};
