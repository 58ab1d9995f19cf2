//! Storage layer for drivecontrol.
//!
//! Everything the application persists is a JSON document under a string key:
//! the account directory, the session marker, and one ledger snapshot per
//! account. [`KeyValueStore`] is the seam; [`Storage`] keeps the documents in
//! `SQLite` and [`MemoryStore`] keeps them in a map for tests and throwaway
//! sessions.

mod memory;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use memory::MemoryStore;

/// Key holding the account directory.
pub const ACCOUNTS_KEY: &str = "accounts";

/// Key holding the session marker.
pub const SESSION_KEY: &str = "session";

/// Prefix of per-account ledger snapshot keys.
pub const LEDGER_KEY_PREFIX: &str = "ledger:";

/// Build the key under which an account's ledger snapshot is stored.
///
/// Ledgers are keyed by the stable account id so renaming an account
/// never detaches it from its data.
#[must_use]
pub fn ledger_key(account_id: &str) -> String {
    format!("{LEDGER_KEY_PREFIX}{account_id}")
}

/// A string-keyed document store.
///
/// Writes overwrite unconditionally; there is no merge and no transaction
/// spanning more than one key.
pub trait KeyValueStore {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Returns `true` if something was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<bool>;

    /// Read and deserialize the JSON document under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored text is not valid
    /// JSON for `T`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize `value` as JSON and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

/// `SQLite`-backed key-value store.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_keys: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM kv_entries", [], |row| row.get(0))?;

        let ledger_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM kv_entries WHERE key LIKE ?1",
            [format!("{LEDGER_KEY_PREFIX}%")],
            |row| row.get(0),
        )?;

        let last_write: Option<String> = self
            .conn
            .query_row("SELECT MAX(updated_at) FROM kv_entries", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_keys,
            ledger_count,
            last_write,
            db_size_bytes,
        })
    }
}

impl KeyValueStore for Storage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        debug!(key, found = value.is_some(), "kv get");
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value],
        )?;
        debug!(key, bytes = value.len(), "kv set");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1", [key])?;
        debug!(key, removed = affected > 0, "kv remove");
        Ok(affected > 0)
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of stored documents.
    pub total_keys: i64,
    /// Number of ledger snapshots.
    pub ledger_count: i64,
    /// UTC timestamp of the most recent write, as recorded by `SQLite`.
    pub last_write: Option<String>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
