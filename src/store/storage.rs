//! Preference storage trait and SQLite implementation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};

/// Key-value backend for persisted store snapshots.
///
/// Values are serialized JSON documents stored under stable names.
pub trait PreferenceStorage: Send + Sync {
  /// Read the document stored under `name`.
  fn load(&self, name: &str) -> Result<Option<String>>;

  /// Store `data` under `name`, replacing any previous document.
  fn save(&self, name: &str, data: &str) -> Result<()>;

  /// Delete the document stored under `name`.
  fn remove(&self, name: &str) -> Result<()>;
}

/// Storage that doesn't keep anything.
/// Used when persistence is disabled - every load misses.
pub struct NoopStorage;

impl PreferenceStorage for NoopStorage {
  fn load(&self, _name: &str) -> Result<Option<String>> {
    Ok(None)
  }

  fn save(&self, _name: &str, _data: &str) -> Result<()> {
    Ok(())
  }

  fn remove(&self, _name: &str) -> Result<()> {
    Ok(())
  }
}

/// Process-local storage, handy for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
  documents: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl PreferenceStorage for MemoryStorage {
  fn load(&self, name: &str) -> Result<Option<String>> {
    let documents = self
      .documents
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(documents.get(name).cloned())
  }

  fn save(&self, name: &str, data: &str) -> Result<()> {
    let mut documents = self
      .documents
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    documents.insert(name.to_string(), data.to_string());
    Ok(())
  }

  fn remove(&self, name: &str) -> Result<()> {
    let mut documents = self
      .documents
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    documents.remove(name);
    Ok(())
  }
}

/// SQLite-based preference storage.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the preference database at the default location.
  pub fn open_default() -> Result<Self> {
    Self::open(&Self::default_path()?)
  }

  /// Open (or create) the preference database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create preferences directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open preferences database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open a private in-memory database.
  pub fn in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory database: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("metrodash").join("preferences.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(PREFERENCES_SCHEMA)
      .map_err(|e| eyre!("Failed to run preferences migrations: {}", e))?;

    Ok(())
  }
}

const PREFERENCES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS preferences (
    name TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl PreferenceStorage for SqliteStorage {
  fn load(&self, name: &str) -> Result<Option<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .query_row(
        "SELECT data FROM preferences WHERE name = ?",
        params![name],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to load preferences '{}': {}", name, e))
  }

  fn save(&self, name: &str, data: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO preferences (name, data, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![name, data],
      )
      .map_err(|e| eyre!("Failed to save preferences '{}': {}", name, e))?;

    Ok(())
  }

  fn remove(&self, name: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM preferences WHERE name = ?", params![name])
      .map_err(|e| eyre!("Failed to remove preferences '{}': {}", name, e))?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sqlite_round_trip_and_replace() {
    let storage = SqliteStorage::in_memory().unwrap();
    assert_eq!(storage.load("ui-store").unwrap(), None);

    storage.save("ui-store", r#"{"a":1}"#).unwrap();
    storage.save("ui-store", r#"{"a":2}"#).unwrap();
    assert_eq!(storage.load("ui-store").unwrap().as_deref(), Some(r#"{"a":2}"#));

    storage.remove("ui-store").unwrap();
    assert_eq!(storage.load("ui-store").unwrap(), None);
  }

  #[test]
  fn test_sqlite_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("preferences.db");

    SqliteStorage::open(&path)
      .unwrap()
      .save("dashboard-layout-store", "{}")
      .unwrap();

    let reopened = SqliteStorage::open(&path).unwrap();
    assert_eq!(
      reopened.load("dashboard-layout-store").unwrap().as_deref(),
      Some("{}")
    );
  }

  #[test]
  fn test_noop_storage_never_returns_data() {
    let storage = NoopStorage;
    storage.save("ui-store", "{}").unwrap();
    assert_eq!(storage.load("ui-store").unwrap(), None);
  }
}
