//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The engine calls store methods — nothing else executes SQL.
//!
//! Game state is an opaque JSON value in a key-value table; this layer
//! never interprets it.

use crate::{error::SimResult, event::EventLogEntry, types::Year};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the simulation database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn run_seed(&self, run_id: &str) -> SimResult<Option<u64>> {
        let seed = self
            .conn
            .query_row("SELECT seed FROM run WHERE run_id = ?1", params![run_id], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        Ok(seed.map(|s| s as u64))
    }

    // ── Key-value state ────────────────────────────────────────

    pub fn put_value(&self, key: &str, value: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, saved_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, saved_at = excluded.saved_at",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_value(&self, key: &str) -> SimResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn delete_value(&self, key: &str) -> SimResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, year, source, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.run_id,
                entry.year as i64,
                entry.source,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_year(&self, run_id: &str, year: Year) -> SimResult<Vec<EventLogEntry>> {
        self.query_events(
            "SELECT id, run_id, year, source, event_type, payload
             FROM event_log WHERE run_id = ?1 AND year = ?2
             ORDER BY id ASC",
            params![run_id, year as i64],
        )
    }

    pub fn events_for_run(&self, run_id: &str) -> SimResult<Vec<EventLogEntry>> {
        self.query_events(
            "SELECT id, run_id, year, source, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY id ASC",
            params![run_id],
        )
    }

    pub fn event_count(&self, run_id: &str, event_type: &str) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn query_events(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let entries = stmt
            .query_map(params, |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    run_id: row.get(1)?,
                    year: row.get::<_, i64>(2)? as Year,
                    source: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
