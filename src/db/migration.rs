use anyhow::Result;
use rusqlite::Connection;
use time::OffsetDateTime;

use super::schema::{
    ADD_MEMORY_WRITE_SEQ, CREATE_MEMORY, INDEX_MEMORY_UPDATED, MIGRATION_TABLE,
};

/// Individual migration with version metadata.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

impl Migration {
    /// Creates a new migration.
    pub const fn new(version: u32, description: &'static str, up: &'static str) -> Self {
        Self {
            version,
            description,
            up,
        }
    }

    /// Checks if this migration has been applied to the database.
    pub fn is_applied(&self, conn: &Connection) -> Result<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?1)",
            [self.version],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Applies this migration and records it in `schema_migrations`,
    /// both inside one transaction.
    pub fn apply(&self, conn: &mut Connection) -> Result<()> {
        let tx = conn.transaction()?;

        tx.execute_batch(self.up)?;

        let applied_at = OffsetDateTime::now_utc().unix_timestamp();
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?1, ?2, ?3)",
            rusqlite::params![self.version, applied_at, self.description],
        )?;

        tx.commit()?;
        Ok(())
    }
}

/// Registry of all migrations in version order.
pub const MIGRATIONS: &[Migration] = &[
    Migration::new(1, "Create memory table", CREATE_MEMORY),
    Migration::new(2, "Index memory by update time", INDEX_MEMORY_UPDATED),
    Migration::new(3, "Add memory write sequence", ADD_MEMORY_WRITE_SEQ),
];

/// Applies all pending migrations in version order.
pub(super) fn apply_pending_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(MIGRATION_TABLE)?;

    for migration in MIGRATIONS {
        if !migration.is_applied(conn)? {
            tracing::debug!(
                version = migration.version,
                description = migration.description,
                "applying migration"
            );
            migration.apply(conn)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_in_strictly_increasing_order() {
        for pair in MIGRATIONS.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
    }

    #[test]
    fn applying_twice_is_a_no_op() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_pending_migrations(&mut conn).unwrap();
        apply_pending_migrations(&mut conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count as usize, MIGRATIONS.len());
    }

    #[test]
    fn write_seq_backfill_follows_update_order() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MIGRATION_TABLE).unwrap();
        MIGRATIONS[0].apply(&mut conn).unwrap();
        MIGRATIONS[1].apply(&mut conn).unwrap();
        conn.execute_batch(
            "INSERT INTO memory (query, summary, created_at, updated_at) VALUES ('late', 's', 1, 20);
             INSERT INTO memory (query, summary, created_at, updated_at) VALUES ('early', 's', 1, 10);",
        )
        .unwrap();

        apply_pending_migrations(&mut conn).unwrap();

        let newest: String = conn
            .query_row(
                "SELECT query FROM memory ORDER BY write_seq DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(newest, "late");
    }

    #[test]
    fn is_applied_reflects_state() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MIGRATION_TABLE).unwrap();
        let first = &MIGRATIONS[0];

        assert!(!first.is_applied(&conn).unwrap());
        first.apply(&mut conn).unwrap();
        assert!(first.is_applied(&conn).unwrap());
    }
}
