//! The sample store - read side of the `position` table.
//!
//! Playback only needs three queries: the two ends of the timeline and the
//! rows recorded at one timestamp. They are split across two traits so the
//! cursor can be driven by anything that knows the timeline bounds.
//!
//! [`SqliteStore`] owns a single connection for its whole lifetime; the
//! render loop holds it from startup to shutdown instead of reopening the
//! database file on every tick.

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, Row};
use thiserror::Error;
use tracing::debug;

use crate::sample::PositionSample;
use crate::timeline::{Timestamp, TimestampError};

/// Errors raised while reading the sample store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// `min`/`max` were asked of a store with no samples
    #[error("timeline is empty: the position table has no rows")]
    EmptyTimeline,

    #[error("stored timestamp is not usable: {0}")]
    Timestamp(#[from] TimestampError),
}

/// The two ends of the recorded timeline.
pub trait TimelineBounds {
    /// Earliest recorded timestamp.
    fn min_time(&self) -> Result<Timestamp, StoreError>;

    /// Latest recorded timestamp.
    fn max_time(&self) -> Result<Timestamp, StoreError>;
}

/// Read access to recorded samples.
pub trait SampleStore: TimelineBounds {
    /// All samples whose stored time equals `time` exactly.
    ///
    /// Order is stable between calls (insertion order). A timestamp with no
    /// samples yields an empty vector, not an error.
    fn samples_at(&self, time: &Timestamp) -> Result<Vec<PositionSample>, StoreError>;
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS position (
        device_id TEXT,
        x_pos REAL,
        y_pos REAL,
        z_pos REAL,
        device_type TEXT,
        time TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_position_time ON position(time);
"#;

/// SQLite-backed sample store.
pub struct SqliteStore {
    pub(crate) conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file for reading and writing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening sample store");
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    /// Open an existing database file read-only (playback).
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening sample store read-only");
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Private in-memory database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Create the `position` table and its time index if missing.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Total number of stored samples.
    pub fn sample_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM position", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Number of distinct timestamps on the timeline.
    pub fn timeline_len(&self) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT time) FROM position",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn bound(&self, sql: &str) -> Result<Timestamp, StoreError> {
        let text: Option<String> = self.conn.query_row(sql, [], |row| row.get(0))?;
        let text = text.ok_or(StoreError::EmptyTimeline)?;
        Ok(text.parse()?)
    }
}

impl TimelineBounds for SqliteStore {
    fn min_time(&self) -> Result<Timestamp, StoreError> {
        self.bound("SELECT MIN(time) FROM position")
    }

    fn max_time(&self) -> Result<Timestamp, StoreError> {
        self.bound("SELECT MAX(time) FROM position")
    }
}

impl SampleStore for SqliteStore {
    fn samples_at(&self, time: &Timestamp) -> Result<Vec<PositionSample>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT device_id, x_pos, y_pos, z_pos, device_type \
             FROM position WHERE time = ?1 ORDER BY rowid",
        )?;

        let samples = stmt
            .query_map(params![time.to_string()], |row| {
                Ok(PositionSample {
                    device_id: text_column(row, 0, "device_id")?,
                    x_pos: real_column(row, 1, "x_pos")?,
                    y_pos: real_column(row, 2, "y_pos")?,
                    z_pos: real_column(row, 3, "z_pos")?,
                    device_type: text_column(row, 4, "device_type")?,
                    time: *time,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(time = %time, rows = samples.len(), "fetched samples");
        Ok(samples)
    }
}

// SQLite columns are dynamically typed: a loader may have stored ids as
// integers or coordinates as text, so decode by value rather than by
// declared type.

fn text_column(row: &Row<'_>, idx: usize, name: &str) -> rusqlite::Result<String> {
    match row.get_ref(idx)? {
        ValueRef::Text(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Integer(i) => Ok(i.to_string()),
        ValueRef::Real(r) => Ok(r.to_string()),
        other => Err(rusqlite::Error::InvalidColumnType(
            idx,
            name.to_string(),
            other.data_type(),
        )),
    }
}

fn real_column(row: &Row<'_>, idx: usize, name: &str) -> rusqlite::Result<f64> {
    let value = row.get_ref(idx)?;
    let parsed = match value {
        ValueRef::Real(r) => Some(r),
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.trim().parse().ok()),
        _ => None,
    };
    parsed.ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(idx, name.to_string(), value.data_type())
    })
}
