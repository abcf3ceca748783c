mod migration;
mod schema;

use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;

pub use migration::{MIGRATIONS, Migration};
use migration::apply_pending_migrations;

/// Database wrapper providing connection management and schema initialization.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens an in-memory SQLite database.
    ///
    /// Automatically initializes the schema on connection open.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn)
    }

    /// Opens a file-based SQLite database at the given path.
    ///
    /// Creates the database file if it does not exist.
    /// Automatically initializes the schema on connection open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    fn initialize(mut conn: Connection) -> Result<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        apply_pending_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Returns the highest applied schema version, or 0 for an empty database.
    pub fn schema_version(&self) -> Result<u32> {
        let version: Option<u32> = self.conn.query_row(
            "SELECT MAX(version) FROM schema_migrations",
            [],
            |row| row.get(0),
        )?;
        Ok(version.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn in_memory_opens_successfully() {
        assert!(Database::in_memory().is_ok());
    }

    #[test]
    fn memory_table_exists() {
        let db = Database::in_memory().unwrap();

        let tables: Vec<String> = db
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"memory".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn all_migrations_recorded() {
        let db = Database::in_memory().unwrap();
        let expected = MIGRATIONS.iter().map(|m| m.version).max().unwrap();
        assert_eq!(db.schema_version().unwrap(), expected);
    }

    #[test]
    fn updated_at_index_exists() {
        let db = Database::in_memory().unwrap();
        let exists: bool = db
            .connection()
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='index' AND name='idx_memory_updated')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(exists);
    }

    #[test]
    fn reopening_file_database_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memory.db");

        {
            let db = Database::open(&path).unwrap();
            db.connection()
                .execute(
                    "INSERT INTO memory (query, summary, created_at, updated_at) VALUES ('q', 's', 1, 1)",
                    [],
                )
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM memory", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let migrations: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(migrations as usize, MIGRATIONS.len());
    }
}
