use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use rusqlite::OptionalExtension;
use tracing::{debug, info, warn};

use crate::Database;
use crate::embedder::{Embedder, cosine_similarity};

use super::record::{
    MemoryMatch, MemoryRecord, decode_embedding, encode_embedding, from_millis, now_millis,
};

/// Cosine similarity a stored query must reach to be reused.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.8;

/// Persistent query memory backed by SQLite.
///
/// Lookups compare the query embedding against every stored embedding and
/// return the best match at or above the threshold. All access goes through a
/// mutex, so writes are serialized and a read never observes a partial write.
/// Storage failures are logged and reported as "no match" or "not stored".
pub struct MemoryStore {
    db: Mutex<Database>,
    embedder: Arc<dyn Embedder>,
    threshold: f32,
}

impl MemoryStore {
    /// Creates a store over `db`. The threshold is clamped to `[0, 1]`.
    pub fn new(db: Database, embedder: Arc<dyn Embedder>, threshold: f32) -> Self {
        Self {
            db: Mutex::new(db),
            embedder,
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Embeds a query, returning `None` (and logging) on failure.
    ///
    /// The query is lower-cased first so matching ignores case; the stored
    /// key keeps the caller's spelling.
    pub fn embed(&self, query: &str) -> Option<Vec<f32>> {
        match self.embedder.embed(&query.to_lowercase()) {
            Ok(embedding) if !embedding.is_empty() => Some(embedding),
            Ok(_) => {
                warn!(query, "embedder returned an empty vector");
                None
            }
            Err(e) => {
                warn!(query, error = %e, "failed to embed query");
                None
            }
        }
    }

    /// Embeds `query` and returns the best stored match, if any.
    pub fn lookup(&self, query: &str) -> Option<MemoryMatch> {
        let embedding = self.embed(query)?;
        self.lookup_embedding(&embedding)
    }

    /// Returns the best stored match for an already computed embedding.
    ///
    /// Rows are scanned most recently written first and only a strictly higher
    /// score replaces the current best, so the latest write wins an exact tie.
    pub fn lookup_embedding(&self, embedding: &[f32]) -> Option<MemoryMatch> {
        match self.best_match(embedding) {
            Ok(Some(found)) => {
                info!(matched = %found.query, score = found.score, "memory hit");
                Some(found)
            }
            Ok(None) => {
                debug!(threshold = self.threshold, "no memory match");
                None
            }
            Err(e) => {
                warn!(error = %e, "memory lookup failed; treating as no match");
                None
            }
        }
    }

    /// Upserts the record for `query`, overwriting any previous summary.
    ///
    /// Returns `false` without writing when the embedding is missing, and
    /// `false` after logging when the write fails.
    pub fn store(&self, query: &str, embedding: Option<&[f32]>, summary: &str) -> bool {
        let Some(embedding) = embedding.filter(|e| !e.is_empty()) else {
            warn!(query, "no embedding available; result not stored");
            return false;
        };

        match self.upsert(query, embedding, summary) {
            Ok(()) => {
                debug!(query, dimensions = embedding.len(), "stored query result");
                true
            }
            Err(e) => {
                warn!(query, error = %e, "failed to store query result");
                false
            }
        }
    }

    /// Returns the record stored under the exact query string.
    pub fn get(&self, query: &str) -> Result<Option<MemoryRecord>> {
        let db = self.database()?;
        db.connection()
            .query_row(
                "SELECT query, summary, embedding, created_at, updated_at FROM memory WHERE query = ?1",
                [query],
                row_to_record,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Lists up to `limit` records, most recently written first.
    pub fn records(&self, limit: usize) -> Result<Vec<MemoryRecord>> {
        let db = self.database()?;
        let mut stmt = db.connection().prepare(
            "SELECT query, summary, embedding, created_at, updated_at
             FROM memory
             ORDER BY write_seq DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records = stmt.query_map([limit], row_to_record)?;
        records.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<i64> {
        let db = self.database()?;
        let count = db
            .connection()
            .query_row("SELECT COUNT(*) FROM memory", [], |row| row.get(0))?;
        Ok(count)
    }

    fn best_match(&self, embedding: &[f32]) -> Result<Option<MemoryMatch>> {
        let db = self.database()?;
        let mut stmt = db.connection().prepare(
            "SELECT query, summary, embedding
             FROM memory
             WHERE embedding IS NOT NULL
             ORDER BY write_seq DESC",
        )?;
        let mut rows = stmt.query([])?;

        let mut best: Option<MemoryMatch> = None;
        while let Some(row) = rows.next()? {
            let bytes: Vec<u8> = row.get(2)?;
            let Some(stored) = decode_embedding(&bytes) else {
                continue;
            };
            // Vectors from a different embedding model have a different length.
            let Some(score) = cosine_similarity(embedding, &stored) else {
                continue;
            };
            if score < self.threshold {
                continue;
            }
            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(MemoryMatch {
                    query: row.get(0)?,
                    summary: row.get(1)?,
                    score,
                });
            }
        }

        Ok(best)
    }

    fn upsert(&self, query: &str, embedding: &[f32], summary: &str) -> Result<()> {
        let db = self.database()?;
        let now = now_millis();
        db.connection().execute(
            "INSERT INTO memory
                 (query, summary, embedding, dimensions, created_at, updated_at, write_seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5, (SELECT COALESCE(MAX(write_seq), 0) + 1 FROM memory))
             ON CONFLICT(query) DO UPDATE SET
                 summary = excluded.summary,
                 embedding = excluded.embedding,
                 dimensions = excluded.dimensions,
                 updated_at = excluded.updated_at,
                 write_seq = excluded.write_seq",
            rusqlite::params![
                query,
                summary,
                encode_embedding(embedding),
                embedding.len() as i64,
                now
            ],
        )?;
        Ok(())
    }

    /// Locks the underlying database.
    pub fn database(&self) -> Result<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| anyhow!("memory database lock poisoned"))
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MemoryRecord> {
    let embedding: Option<Vec<u8>> = row.get(2)?;
    Ok(MemoryRecord::new(
        row.get(0)?,
        row.get(1)?,
        embedding.as_deref().and_then(decode_embedding),
        from_millis(row.get(3)?),
        from_millis(row.get(4)?),
    ))
}
