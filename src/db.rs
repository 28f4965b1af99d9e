mod schema;

use std::path::Path;

use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use time::OffsetDateTime;
use tracing::debug;

use crate::Result;
use schema::INITIAL_SCHEMA;

/// Database wrapper providing connection management and schema initialization.
///
/// Owned by the process entry point and handed to [`VaultStore`](crate::VaultStore)
/// at construction; nothing else holds a connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens an in-memory SQLite database.
    ///
    /// Automatically initializes the schema on connection open.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Opens a file-based SQLite database at the given path.
    ///
    /// Creates the database file if it does not exist.
    /// Automatically initializes the schema on connection open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening vault database");
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// Foreign keys must be on for association cascades to fire.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute("PRAGMA foreign_keys = ON", [])?;
        register_functions(&self.conn)?;
        self.conn.execute_batch(INITIAL_SCHEMA)?;
        Ok(())
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Name of the Unicode-aware lowercase SQL function. SQLite's own `lower()`
/// and `LIKE` only fold ASCII.
pub(crate) const FOLD_CASE_FN: &str = "fold_case";

fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

/// Reads a Unix-seconds column as a UTC timestamp.
pub(crate) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<OffsetDateTime> {
    let secs: i64 = row.get(idx)?;
    OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(db: &Database, kind: &str) -> Vec<String> {
        db.connection()
            .prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
            .unwrap()
            .query_map([kind], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn in_memory_opens_successfully() {
        let result = Database::in_memory();
        assert!(result.is_ok());
    }

    #[test]
    fn schema_tables_exist() {
        let db = Database::in_memory().unwrap();
        let tables = names(&db, "table");

        assert!(tables.contains(&"vault_items".to_string()));
        assert!(tables.contains(&"tags".to_string()));
        assert!(tables.contains(&"item_tags".to_string()));
    }

    #[test]
    fn schema_indexes_exist() {
        let db = Database::in_memory().unwrap();
        let indexes = names(&db, "index");

        for expected in [
            "idx_vault_items_kind",
            "idx_vault_items_pinned",
            "idx_vault_items_archived",
            "idx_vault_items_created",
            "idx_item_tags_item",
            "idx_item_tags_tag",
        ] {
            assert!(indexes.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn foreign_keys_enabled() {
        let db = Database::in_memory().unwrap();

        let fk_enabled: i32 = db
            .connection()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert_eq!(fk_enabled, 1);
    }

    #[test]
    fn blank_content_is_rejected_by_the_schema() {
        let db = Database::in_memory().unwrap();

        let result = db.connection().execute(
            "INSERT INTO vault_items (content_kind, content, created_at, updated_at)
             VALUES ('note', '   ', 0, 0)",
            [],
        );

        assert!(result.is_err());
    }

    #[test]
    fn tag_names_are_unique_regardless_of_case() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        conn.execute(
            "INSERT INTO tags (name, created_at) VALUES ('music', 0)",
            [],
        )
        .unwrap();
        let duplicate = conn.execute(
            "INSERT INTO tags (name, created_at) VALUES ('MUSIC', 0)",
            [],
        );

        assert!(duplicate.is_err());
    }

    #[test]
    fn open_creates_database_file() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let result = Database::open(&db_path);
        assert!(result.is_ok());
        assert!(db_path.exists());
    }

    #[test]
    fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        {
            let db = Database::open(&db_path).unwrap();
            db.connection()
                .execute(
                    "INSERT INTO vault_items (content_kind, content, created_at, updated_at)
                     VALUES ('note', 'test', 0, 0)",
                    [],
                )
                .unwrap();
        }

        let db2 = Database::open(&db_path);
        assert!(db2.is_ok());

        let count: i32 = db2
            .unwrap()
            .connection()
            .query_row("SELECT COUNT(*) FROM vault_items", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
