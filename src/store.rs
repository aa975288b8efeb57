use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::StorefrontResult;

const MIGRATION_SQL_0001: &str = include_str!("../migrations/0001_initial.sql");

/// String key-value persistence used by the cart and the auth token.
pub trait KeyValueStore: Send + Sync {
  fn get(&self, key: &str) -> StorefrontResult<Option<String>>;

  fn set(&self, key: &str, value: &str) -> StorefrontResult<()>;

  fn remove(&self, key: &str) -> StorefrontResult<()>;
}

#[derive(Clone, Debug)]
pub struct SqliteKeyValueStore {
  db_path: PathBuf,
}

impl SqliteKeyValueStore {
  /// Creates the database file and its tables when missing.
  pub fn open(db_path: &Path) -> StorefrontResult<Self> {
    if let Some(parent) = db_path.parent() {
      fs::create_dir_all(parent)?;
    }

    let connection = Connection::open(db_path)?;
    connection.execute_batch(MIGRATION_SQL_0001)?;
    Ok(Self {
      db_path: db_path.to_path_buf(),
    })
  }

  fn connect(&self) -> StorefrontResult<Connection> {
    Ok(Connection::open(&self.db_path)?)
  }
}

impl KeyValueStore for SqliteKeyValueStore {
  fn get(&self, key: &str) -> StorefrontResult<Option<String>> {
    let connection = self.connect()?;
    let value = connection
      .query_row(
        "SELECT value FROM key_value_entries WHERE key = ?1 LIMIT 1",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }

  fn set(&self, key: &str, value: &str) -> StorefrontResult<()> {
    let connection = self.connect()?;
    connection.execute(
      "INSERT INTO key_value_entries (key, value, updated_at)
       VALUES (?1, ?2, ?3)
       ON CONFLICT(key) DO UPDATE SET
         value = excluded.value,
         updated_at = excluded.updated_at",
      params![key, value, Utc::now().to_rfc3339()],
    )?;
    Ok(())
  }

  fn remove(&self, key: &str) -> StorefrontResult<()> {
    let connection = self.connect()?;
    connection.execute("DELETE FROM key_value_entries WHERE key = ?1", params![key])?;
    Ok(())
  }
}

/// Process-local store for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryKeyValueStore {
  fn get(&self, key: &str) -> StorefrontResult<Option<String>> {
    let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(entries.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> StorefrontResult<()> {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> StorefrontResult<()> {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries.remove(key);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use tempfile::TempDir;

  #[test]
  fn sqlite_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("storefront.db");

    let store = SqliteKeyValueStore::open(&path).unwrap();
    assert_eq!(store.get("cart").unwrap(), None);
    store.set("cart", "[1]").unwrap();
    store.set("cart", "[1,2]").unwrap();

    let reopened = SqliteKeyValueStore::open(&path).unwrap();
    assert_eq!(reopened.get("cart").unwrap().as_deref(), Some("[1,2]"));

    reopened.remove("cart").unwrap();
    assert_eq!(store.get("cart").unwrap(), None);
  }

  #[test]
  fn memory_store_round_trips() {
    let store = MemoryKeyValueStore::new();
    store.set("token", "abc").unwrap();
    assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));
    store.remove("token").unwrap();
    assert_eq!(store.get("token").unwrap(), None);
  }
}
