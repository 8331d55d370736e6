use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

/// Key-value cache backed by a single SQLite table
///
/// Values are stored as JSON alongside the time they were written, so
/// callers can make their own freshness decisions. Each `set` is a single
/// statement: a reader never sees a value paired with another write's timestamp.
pub struct CacheManager {
    conn: Mutex<Connection>,
}

/// A cached value together with the moment it was written
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry<T> {
    pub value: T,
    pub cached_at: DateTime<Utc>,
}

impl CacheManager {
    /// Open (or create) a cache file on disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::init_schema(&conn)?;
        debug!("Opened cache at {}", path.as_ref().display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Cache that lives only as long as this value; handy for tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                cached_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    /// Read a value; an undecodable entry is dropped and reported as a miss
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedEntry<T>>> {
        let conn = self.lock()?;
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT value, cached_at FROM kv_cache WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((raw, cached_at_ms)) = row else {
            debug!("Cache miss for {}", key);
            return Ok(None);
        };

        let value = match serde_json::from_str::<T>(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Dropping undecodable cache entry {}: {}", key, e);
                conn.execute("DELETE FROM kv_cache WHERE key = ?1", params![key])?;
                return Ok(None);
            }
        };

        let Some(cached_at) = Utc.timestamp_millis_opt(cached_at_ms).single() else {
            warn!("Dropping cache entry {} with invalid timestamp {}", key, cached_at_ms);
            conn.execute("DELETE FROM kv_cache WHERE key = ?1", params![key])?;
            return Ok(None);
        };

        debug!("Cache hit for {}", key);
        Ok(Some(CachedEntry { value, cached_at }))
    }

    /// Write a value, replacing whatever was stored under `key`
    pub fn set<T: Serialize>(&self, key: &str, value: &T, cached_at: DateTime<Utc>) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv_cache (key, value, cached_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, cached_at = excluded.cached_at",
            params![key, raw, cached_at.timestamp_millis()],
        )?;

        Ok(())
    }

    /// Remove a single key. Returns whether anything was removed
    pub fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM kv_cache WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    pub fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv_cache", [])?;
        Ok(())
    }
}
