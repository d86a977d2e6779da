//! Save-slot persistence.
//!
//! RULE: Only store.rs talks to the database.
//! Units and the save layer go through the SaveStore trait and
//! never execute SQL directly.

use crate::error::SimResult;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;

/// A bounded key/value space of save slots.
pub trait SaveStore {
    /// All slot keys currently present.
    fn keys(&self) -> SimResult<Vec<String>>;

    fn get(&self, key: &str) -> SimResult<Option<String>>;

    /// Insert or overwrite a slot.
    fn put(&mut self, key: &str, payload: &str) -> SimResult<()>;

    /// Remove a slot. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> SimResult<()>;
}

/// SQLite-backed save slots.
pub struct SqliteSaveStore {
    conn: Connection,
}

impl SqliteSaveStore {
    /// Open (or create) the save database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../migrations/001_save_slots.sql"))?;
        Ok(())
    }

    /// When a slot was last written (RFC 3339).
    pub fn saved_at(&self, key: &str) -> SimResult<Option<String>> {
        let saved_at = self
            .conn
            .query_row(
                "SELECT saved_at FROM save_slot WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(saved_at)
    }
}

impl SaveStore for SqliteSaveStore {
    fn keys(&self) -> SimResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM save_slot ORDER BY key ASC")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn get(&self, key: &str) -> SimResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM save_slot WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn put(&mut self, key: &str, payload: &str) -> SimResult<()> {
        let saved_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO save_slot (key, payload, saved_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET payload = excluded.payload,
                                            saved_at = excluded.saved_at",
            params![key, payload, saved_at],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> SimResult<()> {
        self.conn.execute("DELETE FROM save_slot WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-process save slots for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemorySaveStore {
    slots: BTreeMap<String, String>,
}

impl MemorySaveStore {
    pub fn new() -> Self { Self::default() }
}

impl SaveStore for MemorySaveStore {
    fn keys(&self) -> SimResult<Vec<String>> {
        Ok(self.slots.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> SimResult<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn put(&mut self, key: &str, payload: &str) -> SimResult<()> {
        self.slots.insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> SimResult<()> {
        self.slots.remove(key);
        Ok(())
    }
}
