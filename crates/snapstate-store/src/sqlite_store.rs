use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde_json::Value;
use snapstate_common::{Error, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::store::{StateStore, empty_snapshot, parse_snapshot, quarantine_suffix};

const DEFAULT_KEY: &str = "session";

/// Snapshot kept as a JSON document in a single SQLite key/value table.
pub struct SqliteStateStore {
    conn: Connection,
    key: String,
    location: String,
    read_only: bool,
}

impl SqliteStateStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening state store at {}", db_path.display());
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Store(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| Error::Store(format!("failed to set pragmas: {e}")))?;

        let store = Self {
            conn,
            key: DEFAULT_KEY.to_string(),
            location: db_path.display().to_string(),
            read_only: false,
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Open for inspection only. Nothing is created or changed on disk: a
    /// missing database (or one without the state table) reads as empty, and
    /// `save`/`quarantine` are refused.
    pub fn open_read_only(db_path: &Path) -> Result<Self> {
        let location = db_path.display().to_string();
        if !db_path.exists() {
            info!("no state store at {location}, reading as empty");
            return Self::empty_read_only(location);
        }

        info!("opening state store at {location} (read-only)");
        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| Error::Store(format!("failed to open database: {e}")))?;
        if !has_state_table(&conn)? {
            info!("{location} has no app_state table, reading as empty");
            return Self::empty_read_only(location);
        }

        Ok(Self {
            conn,
            key: DEFAULT_KEY.to_string(),
            location,
            read_only: true,
        })
    }

    fn empty_read_only(location: String) -> Result<Self> {
        let mut store = Self::in_memory()?;
        store.location = location;
        store.read_only = true;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Store(format!("failed to open in-memory database: {e}")))?;

        let store = Self {
            conn,
            key: DEFAULT_KEY.to_string(),
            location: ":memory:".to_string(),
            read_only: false,
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Use a different row, e.g. one per application profile.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS app_state (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );",
            )
            .map_err(|e| Error::Store(format!("table setup failed: {e}")))?;

        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::Store(format!("{} is opened read-only", self.describe())));
        }
        Ok(())
    }
}

fn has_state_table(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'app_state'",
            [],
            |row| row.get(0),
        )
        .map_err(|e| Error::Store(format!("failed to inspect database: {e}")))?;
    Ok(count > 0)
}

impl StateStore for SqliteStateStore {
    fn load(&self) -> Result<Value> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Store(format!("failed to read snapshot: {e}")))?;

        match raw {
            Some(raw) => parse_snapshot(&raw, &self.describe()),
            None => {
                info!("no snapshot stored under '{}', starting empty", self.key);
                Ok(empty_snapshot())
            }
        }
    }

    fn save(&self, state: &Value) -> Result<()> {
        self.ensure_writable()?;
        let raw = serde_json::to_string(state)?;
        self.conn
            .execute(
                "INSERT INTO app_state (key, value, updated_at)
                 VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![self.key, raw],
            )
            .map_err(|e| Error::Store(format!("failed to write snapshot: {e}")))?;

        info!("saved snapshot under '{}'", self.key);
        Ok(())
    }

    fn quarantine(&self) -> Result<Option<String>> {
        self.ensure_writable()?;
        let target = format!("{}.{}", self.key, quarantine_suffix());
        let moved = self
            .conn
            .execute(
                "UPDATE app_state SET key = ?1 WHERE key = ?2",
                params![target, self.key],
            )
            .map_err(|e| Error::Store(format!("failed to move snapshot aside: {e}")))?;

        if moved == 0 {
            return Ok(None);
        }
        warn!("moved unrestorable snapshot '{}' to '{}'", self.key, target);
        Ok(Some(target))
    }

    fn describe(&self) -> String {
        format!("sqlite {} [{}]", self.location, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStateStore;
    use crate::store::StateStore;
    use rusqlite::params;
    use serde_json::json;

    #[test]
    fn in_memory_creates_app_state_table() {
        let store = SqliteStateStore::in_memory().expect("failed to create in-memory store");
        let exists: i64 = store
            .connection()
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='app_state'",
                [],
                |row| row.get(0),
            )
            .expect("failed to query sqlite_master");

        assert_eq!(exists, 1);
    }

    #[test]
    fn load_is_empty_until_saved() {
        let store = SqliteStateStore::in_memory().expect("failed to create in-memory store");
        assert_eq!(store.load().unwrap(), json!({}));

        let state = json!({"meta": {"version": "202006231303"}, "tabs": {"data": []}});
        store.save(&state).unwrap();
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn keys_are_independent() {
        let store = SqliteStateStore::in_memory().unwrap().with_key("profile-a");
        store.save(&json!({"a": 1})).unwrap();

        let rows: i64 = store
            .connection()
            .query_row("SELECT count(*) FROM app_state WHERE key = 'session'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn corrupt_row_fails_load_and_can_be_quarantined() {
        let store = SqliteStateStore::in_memory().expect("failed to create in-memory store");
        store
            .connection()
            .execute(
                "INSERT INTO app_state (key, value) VALUES (?1, ?2)",
                params!["session", "{not json"],
            )
            .unwrap();

        assert!(store.load().is_err());

        let moved = store.quarantine().unwrap().expect("row should be moved");
        assert!(moved.starts_with("session.corrupt-"));
        assert_eq!(store.load().unwrap(), json!({}));
        assert_eq!(store.quarantine().unwrap(), None);
    }

    #[test]
    fn open_persists_across_connections() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("state.db");
        let state = json!({"windows": {"w": {"state": {}}}});

        SqliteStateStore::open(&path).unwrap().save(&state).unwrap();
        assert_eq!(SqliteStateStore::open(&path).unwrap().load().unwrap(), state);
    }

    #[test]
    fn read_only_open_of_missing_database_creates_nothing() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("nested").join("state.db");

        let store = SqliteStateStore::open_read_only(&path).unwrap();
        assert!(store.is_read_only());
        assert_eq!(store.load().unwrap(), json!({}));
        assert!(store.save(&json!({"a": 1})).is_err());
        assert!(store.quarantine().is_err());
        assert!(store.describe().contains("state.db"));

        assert!(!path.exists());
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn read_only_open_reads_but_never_writes() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("state.db");
        let state = json!({"tabs": {"data": []}});
        SqliteStateStore::open(&path).unwrap().save(&state).unwrap();

        let store = SqliteStateStore::open_read_only(&path).unwrap();
        assert_eq!(store.load().unwrap(), state);
        assert!(store.save(&json!({})).is_err());
        assert!(store.quarantine().is_err());

        assert_eq!(SqliteStateStore::open(&path).unwrap().load().unwrap(), state);
    }
}
