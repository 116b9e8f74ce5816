//! SQLite cache for extracted annual-report records.

use crate::error::{IxbrlError, Result};
use crate::model::AnnualReportRecord;
use crate::source::{EntityId, ResultCache};
use chrono::{Duration, SecondsFormat, Utc};
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

/// Default time-to-live for cached records, in days.
pub const DEFAULT_TTL_DAYS: i64 = 30;

/// SQLite-backed [`ResultCache`].
///
/// Records are stored as JSON keyed by (entity, filing id). Rows past their
/// expiry are never returned and can be removed with
/// [`purge_expired`](Self::purge_expired).
#[derive(Debug)]
pub struct SqliteResultCache {
    conn: Connection,
    ttl: Duration,
}

impl SqliteResultCache {
    /// Create a new SQLite cache.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self {
            conn,
            ttl: Duration::days(DEFAULT_TTL_DAYS),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self {
            conn,
            ttl: Duration::days(DEFAULT_TTL_DAYS),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Set the time-to-live applied to records stored from now on.
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                entity TEXT NOT NULL,
                filing_id TEXT NOT NULL,
                data TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                hit_count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (entity, filing_id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_records_expires ON records(expires_at)",
            [],
        )?;

        Ok(())
    }

    /// Remove expired records, returning how many were deleted.
    pub fn purge_expired(&self) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM records WHERE expires_at <= ?1", params![now()])?;
        debug!("purged {removed} expired cache records");
        Ok(removed)
    }

    /// Clear all cached data.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM records", [])?;
        Ok(())
    }

    /// Clear cached records for one entity.
    pub fn clear_entity(&self, entity: &EntityId) -> Result<()> {
        self.conn.execute(
            "DELETE FROM records WHERE entity = ?1",
            params![entity.as_str()],
        )?;
        Ok(())
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;

        let expired: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE expires_at <= ?1",
            params![now()],
            |row| row.get(0),
        )?;

        let entities: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT entity) FROM records", [], |row| {
                    row.get(0)
                })?;

        let hits: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(hit_count), 0) FROM records",
            [],
            |row| row.get(0),
        )?;

        Ok(CacheStats {
            total_records: total as usize,
            expired_records: expired as usize,
            unique_entities: entities as usize,
            total_hits: hits as usize,
        })
    }
}

impl ResultCache for SqliteResultCache {
    fn get(&self, entity: &EntityId, filing_id: &str) -> Result<Option<AnnualReportRecord>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM records
                 WHERE entity = ?1 AND filing_id = ?2 AND expires_at > ?3",
                params![entity.as_str(), filing_id, now()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(data) = data else {
            return Ok(None);
        };

        self.conn.execute(
            "UPDATE records SET hit_count = hit_count + 1
             WHERE entity = ?1 AND filing_id = ?2",
            params![entity.as_str(), filing_id],
        )?;
        debug!("cache hit for {entity} {filing_id}");

        serde_json::from_str(&data).map(Some).map_err(|e| {
            IxbrlError::Cache(format!("stored record for {entity} {filing_id} is unreadable: {e}"))
        })
    }

    fn put(&self, entity: &EntityId, filing_id: &str, record: &AnnualReportRecord) -> Result<()> {
        let data = serde_json::to_string(record)?;
        let cached_at = Utc::now();
        let expires_at = cached_at + self.ttl;

        self.conn.execute(
            "INSERT OR REPLACE INTO records (entity, filing_id, data, cached_at, expires_at, hit_count)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![
                entity.as_str(),
                filing_id,
                data,
                cached_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ],
        )?;

        Ok(())
    }
}

/// Current time in the fixed-width form stored in the table, so that text
/// comparison orders timestamps.
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of stored records
    pub total_records: usize,
    /// Records past their expiry
    pub expired_records: usize,
    /// Number of distinct entities
    pub unique_entities: usize,
    /// Sum of hits over all records
    pub total_hits: usize,
}
