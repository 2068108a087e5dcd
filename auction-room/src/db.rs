// SQLite persistence layer for auction events and recovery state.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::auction::AuctionEvent;

/// A committed event as read back from the log.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    /// Monotonically increasing across the whole database.
    pub id: i64,
    pub event: AuctionEvent,
    pub timestamp: String,
}

/// SQLite-backed event log plus a key-value store for snapshots.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS auction_events (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id   TEXT NOT NULL,
                kind      TEXT NOT NULL,
                payload   TEXT NOT NULL,
                timestamp TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX IF NOT EXISTS idx_auction_events_room_id ON auction_events(room_id);

            CREATE TABLE IF NOT EXISTS auction_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Append a committed event for `room_id` and return its id.
    pub fn record_event(&self, room_id: &str, event: &AuctionEvent) -> Result<i64> {
        let conn = self.conn();
        let payload = serde_json::to_string(event).context("failed to serialize event")?;
        conn.execute(
            "INSERT INTO auction_events (room_id, kind, payload) VALUES (?1, ?2, ?3)",
            params![room_id, event.kind(), payload],
        )
        .context("failed to record auction event")?;
        Ok(conn.last_insert_rowid())
    }

    /// Events for `room_id` in commit order.
    pub fn load_events(&self, room_id: &str) -> Result<Vec<StoredEvent>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, payload, timestamp FROM auction_events
                 WHERE room_id = ?1 ORDER BY id",
            )
            .context("failed to prepare load_events query")?;

        let rows = stmt
            .query_map(params![room_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .context("failed to query auction events")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map auction event rows")?;

        rows.into_iter()
            .map(|(id, payload, timestamp)| -> Result<StoredEvent> {
                let event = serde_json::from_str(&payload)
                    .with_context(|| format!("failed to deserialize event {id}"))?;
                Ok(StoredEvent {
                    id,
                    event,
                    timestamp,
                })
            })
            .collect()
    }

    pub fn event_count(&self, room_id: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM auction_events WHERE room_id = ?1",
                params![room_id],
                |row| row.get(0),
            )
            .context("failed to count auction events")?;
        Ok(count as usize)
    }

    /// Persist an arbitrary JSON value under `key`. Repeated saves overwrite.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO auction_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM auction_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query auction state")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read state row")?;
                let value: serde_json::Value = serde_json::from_str(&json_str)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Room ID management
    // ------------------------------------------------------------------

    const ROOM_ID_KEY: &'static str = "current_room_id";

    pub fn get_room_id(&self) -> Result<Option<String>> {
        let value = self.load_state(Self::ROOM_ID_KEY)?;
        Ok(value.and_then(|v| v.as_str().map(|s| s.to_string())))
    }

    pub fn set_room_id(&self, room_id: &str) -> Result<()> {
        self.save_state(
            Self::ROOM_ID_KEY,
            &serde_json::Value::String(room_id.to_string()),
        )
    }

    /// New room id from the current UTC time, e.g. `room_20261016_143022_123`.
    pub fn generate_room_id() -> String {
        let now = chrono::Utc::now();
        now.format("room_%Y%m%d_%H%M%S_%3f").to_string()
    }
}
