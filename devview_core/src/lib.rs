//! DevView Core - Time-Cursor Playback of Recorded Device Positions
//!
//! A store of 3D device positions keyed by second-resolution timestamps is
//! replayed one second per timer tick:
//! 1. **Cursor**: advance the clock by one second, wrapping at the end of the
//!    recorded timeline
//! 2. **Store**: fetch every sample recorded at the new timestamp
//! 3. **Views**: project the samples into a paginated table and a 3D scatter
//!    grouped by device type, then hand the frame to the display sinks

pub mod timeline;
pub mod sample;
pub mod store;
pub mod cursor;
pub mod views;
pub mod config;
pub mod cycle;
pub mod ingest;
pub mod sink;

#[cfg(feature = "dashboard")]
pub mod dashboard;

#[cfg(feature = "visualization")]
pub mod visualization;

// Re-export key types for convenience
pub use config::PlaybackConfig;
pub use cursor::PlaybackCursor;
pub use cycle::{PlaybackError, RenderCycle, RenderFrame};
pub use ingest::{ingest_csv, ingest_csv_file, IngestError, IngestReport};
pub use sample::PositionSample;
pub use sink::{FrameSink, JsonLinesSink, LogSink, SinkError};
pub use store::{SampleStore, SqliteStore, StoreError, TimelineBounds};
pub use timeline::{DayRollover, Timestamp, TimestampError};
