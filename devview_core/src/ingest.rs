//! One-shot CSV ingestion into the `position` table.
//!
//! Columns are read by position, not by header name:
//! `device_id, x_pos, y_pos, z_pos, device_type, time`. The first line is
//! always treated as a header and dropped. Every row goes in through a single
//! transaction that is committed once at the end, so a bad row leaves the
//! table exactly as it was.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::store::{SqliteStore, StoreError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Summary of a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub rows_inserted: usize,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    device_id: String,
    x_pos: f64,
    y_pos: f64,
    z_pos: f64,
    device_type: String,
    time: String,
}

/// Load every data row of `reader` into `store` in one transaction.
pub fn ingest_csv<R: Read>(
    store: &mut SqliteStore,
    reader: R,
) -> Result<IngestReport, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let rows = csv_reader
        .records()
        .map(|record| Ok(record?.deserialize::<CsvRow>(None)?))
        .collect::<Result<Vec<_>, csv::Error>>()?;
    debug!(rows = rows.len(), "parsed CSV");

    let tx = store.conn.transaction()?;
    {
        let mut insert = tx.prepare(
            "INSERT INTO position (device_id, x_pos, y_pos, z_pos, device_type, time) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for row in &rows {
            insert.execute(params![
                row.device_id,
                row.x_pos,
                row.y_pos,
                row.z_pos,
                row.device_type,
                row.time,
            ])?;
        }
    }
    tx.commit()?;

    info!(rows = rows.len(), "ingested position samples");
    Ok(IngestReport {
        rows_inserted: rows.len(),
    })
}

/// Ensure the schema exists, then load the CSV file at `path`.
pub fn ingest_csv_file(
    store: &mut SqliteStore,
    path: impl AsRef<Path>,
) -> Result<IngestReport, IngestError> {
    let path = path.as_ref();
    info!(path = %path.display(), "loading CSV");
    store.ensure_schema()?;
    ingest_csv(store, File::open(path)?)
}
