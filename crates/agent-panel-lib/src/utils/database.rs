// SQLite Database Connection Management
// Backs the host key-value store used for panel configuration

use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use super::schema;
use crate::error::{PanelError, PanelResult};

/// Application identifier used for the data directory
pub const APP_IDENTIFIER: &str = "com.agentpanel.AgentPanel";

/// Database file name
#[cfg(debug_assertions)]
pub const DATABASE_FILE: &str = "agent-panel-dev.db";

#[cfg(not(debug_assertions))]
pub const DATABASE_FILE: &str = "agent-panel.db";

/// Thread-safe database wrapper
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) a database file and run migrations
    pub fn new(path: PathBuf) -> PanelResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA busy_timeout=5000;
            PRAGMA synchronous=NORMAL;
            "#,
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open a private in-memory database
    pub fn new_in_memory() -> PanelResult<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
            path: None,
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Database file path (None for in-memory databases)
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    fn lock(&self) -> PanelResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PanelError::Storage(format!("Failed to acquire database lock: {}", e)))
    }

    fn run_migrations(&self) -> PanelResult<()> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)
    }

    /// Execute a function with the database connection
    pub fn with_connection<T, F>(&self, f: F) -> PanelResult<T>
    where
        F: FnOnce(&Connection) -> PanelResult<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Execute a function inside a transaction.
    /// Commits on success; dropping the transaction on error rolls back.
    pub fn with_transaction<T, F>(&self, f: F) -> PanelResult<T>
    where
        F: FnOnce(&Connection) -> PanelResult<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    // =========================================================================
    // Key-value access
    // =========================================================================

    pub fn get_value(&self, key: &str) -> PanelResult<Option<String>> {
        self.with_connection(|conn| get_value(conn, key))
    }

    pub fn set_value(&self, key: &str, value: &str) -> PanelResult<()> {
        self.with_connection(|conn| set_value(conn, key, value))
    }

    pub fn delete_value(&self, key: &str) -> PanelResult<bool> {
        self.with_connection(|conn| {
            let deleted = conn.execute("DELETE FROM panel_store WHERE key = ?1", [key])?;
            Ok(deleted > 0)
        })
    }

    pub fn schema_version(&self) -> PanelResult<i32> {
        self.with_connection(schema::get_version)
    }
}

/// Read one key on an open connection or transaction
pub fn get_value(conn: &Connection, key: &str) -> PanelResult<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM panel_store WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

/// Upsert one key on an open connection or transaction
pub fn set_value(conn: &Connection, key: &str, value: &str) -> PanelResult<()> {
    conn.execute(
        r#"
        INSERT INTO panel_store (key, value, updated_at)
        VALUES (?1, ?2, datetime('now'))
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        [key, value],
    )?;
    Ok(())
}

/// Get the default database path
pub fn get_database_path() -> PanelResult<PathBuf> {
    dirs::data_dir()
        .map(|p| p.join(APP_IDENTIFIER).join(DATABASE_FILE))
        .ok_or_else(|| {
            PanelError::Storage("Could not determine application data directory".to_string())
        })
}

/// Open the default database
pub fn open_default_database() -> PanelResult<Database> {
    Database::new(get_database_path()?)
}
