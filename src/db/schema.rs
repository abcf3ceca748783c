/// Migration bookkeeping table, created before any migration runs.
pub const MIGRATION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL,
    description TEXT
);
"#;

/// Version 1: the query memory.
///
/// One row per exact query string. `embedding` holds little-endian f32 values
/// and may be NULL; `dimensions` records the vector length for diagnostics.
/// Timestamps are Unix milliseconds.
pub const CREATE_MEMORY: &str = r#"
CREATE TABLE IF NOT EXISTS memory (
    query TEXT PRIMARY KEY,
    summary TEXT NOT NULL,
    embedding BLOB,
    dimensions INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;

/// Version 2: lookups scan newest first.
pub const INDEX_MEMORY_UPDATED: &str = r#"
CREATE INDEX IF NOT EXISTS idx_memory_updated ON memory(updated_at);
"#;

/// Version 3: a write counter bumped on every insert or overwrite.
///
/// Orders records by recency when several writes share a millisecond.
pub const ADD_MEMORY_WRITE_SEQ: &str = r#"
ALTER TABLE memory ADD COLUMN write_seq INTEGER NOT NULL DEFAULT 0;
UPDATE memory SET write_seq = (
    SELECT COUNT(*) FROM memory AS earlier
    WHERE earlier.updated_at < memory.updated_at
       OR (earlier.updated_at = memory.updated_at AND earlier.rowid <= memory.rowid)
);
CREATE INDEX IF NOT EXISTS idx_memory_write_seq ON memory(write_seq);
"#;
