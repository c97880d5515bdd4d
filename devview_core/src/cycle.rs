//! The render cycle - one tick of playback.
//!
//! ```text
//! tick ──► cursor.advance ──► store.samples_at ──┬──► TableView
//!                                                └──► ScatterView
//! ```
//!
//! The cycle owns both the store (and therefore its connection) and the
//! cursor. Each call to [`RenderCycle::tick`] finishes its query and both
//! projections before returning, so there is never more than one tick in
//! flight.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::PlaybackConfig;
use crate::cursor::PlaybackCursor;
use crate::sink::SinkError;
use crate::store::{SampleStore, StoreError};
use crate::timeline::Timestamp;
use crate::views::{SceneLayout, ScatterView, TableView};

/// Errors that end a playback session.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("frame sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Everything rendered for one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    /// Timer tick that produced this frame (label only)
    pub tick: u64,
    /// Clock label: the timestamp shown
    pub time: Timestamp,
    pub table: TableView,
    pub scatter: ScatterView,
}

/// Advances the cursor and renders the samples at each new position.
pub struct RenderCycle<S> {
    store: S,
    cursor: PlaybackCursor,
    page_size: usize,
    scene: SceneLayout,
}

impl<S: SampleStore> RenderCycle<S> {
    /// Start a session at the beginning of the recorded timeline.
    pub fn new(store: S, config: &PlaybackConfig) -> Result<Self, StoreError> {
        let cursor = PlaybackCursor::at_start(&store, config.day_rollover)?;
        debug!(start = %cursor.current(), "render cycle ready");
        Ok(Self {
            store,
            cursor,
            page_size: config.page_size,
            scene: config.scene,
        })
    }

    /// Timestamp currently on display.
    pub fn current(&self) -> &Timestamp {
        self.cursor.current()
    }

    /// Advance one second and render the samples found there.
    pub fn tick(&mut self, tick_count: u64) -> Result<RenderFrame, StoreError> {
        let time = *self.cursor.advance(&self.store)?;
        self.frame_at(tick_count, time)
    }

    /// Render an arbitrary timestamp without moving the cursor.
    pub fn frame_at(&self, tick_count: u64, time: Timestamp) -> Result<RenderFrame, StoreError> {
        let rows = self.store.samples_at(&time)?;
        Ok(RenderFrame {
            tick: tick_count,
            time,
            table: TableView::from_samples(&rows, self.page_size),
            scatter: ScatterView::from_samples(&rows, self.scene),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest_csv;
    use crate::store::SqliteStore;
    use crate::timeline::DayRollover;

    const CSV: &str = "\
device_id,x_pos,y_pos,z_pos,device_type,time
d1,1.0,2.0,3.0,drone,2024-01-01 00:00:58
d2,4.0,5.0,6.0,tag,2024-01-01 00:00:58
d1,1.5,2.5,3.5,drone,2024-01-01 00:00:59
d1,2.0,3.0,4.0,drone,2024-01-01 00:01:00
d2,5.0,6.0,7.0,tag,2024-01-01 00:01:00
d3,9.0,9.0,9.0,drone,2024-01-01 00:01:00
d1,2.5,3.5,4.5,drone,2024-01-01 00:01:02
";

    fn loaded_store() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        ingest_csv(&mut store, CSV.as_bytes()).unwrap();
        store
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn test_starts_at_min_time() {
        let cycle = RenderCycle::new(loaded_store(), &PlaybackConfig::default()).unwrap();
        assert_eq!(cycle.current(), &ts("2024-01-01 00:00:58"));
    }

    #[test]
    fn test_tick_renders_next_second() {
        let mut cycle = RenderCycle::new(loaded_store(), &PlaybackConfig::default()).unwrap();
        let frame = cycle.tick(0).unwrap();

        assert_eq!(frame.time, ts("2024-01-01 00:00:59"));
        assert_eq!(frame.table.len(), 1);
        assert_eq!(frame.scatter.series.len(), 1);
        assert_eq!(cycle.current(), &frame.time);
    }

    #[test]
    fn test_three_devices_two_types_give_two_series() {
        let mut cycle = RenderCycle::new(loaded_store(), &PlaybackConfig::default()).unwrap();
        cycle.tick(0).unwrap();
        let frame = cycle.tick(1).unwrap();

        assert_eq!(frame.time, ts("2024-01-01 00:01:00"));
        assert_eq!(frame.table.len(), 3);
        assert_eq!(frame.scatter.series.len(), 2);

        let drone = &frame.scatter.series[0];
        let tag = &frame.scatter.series[1];
        assert_eq!(drone.name, "drone");
        assert_eq!(
            drone.points.iter().map(|p| p.device_id.as_str()).collect::<Vec<_>>(),
            ["d1", "d3"]
        );
        assert_eq!(tag.name, "tag");
        assert_eq!(tag.points.len(), 1);
        assert_eq!(tag.points[0].device_id, "d2");
    }

    #[test]
    fn test_gap_in_recording_renders_empty_frame() {
        let mut cycle = RenderCycle::new(loaded_store(), &PlaybackConfig::default()).unwrap();
        cycle.tick(0).unwrap();
        cycle.tick(1).unwrap();
        let frame = cycle.tick(2).unwrap();

        // 00:01:01 was never recorded
        assert_eq!(frame.time, ts("2024-01-01 00:01:01"));
        assert!(frame.table.is_empty());
        assert!(frame.scatter.series.is_empty());
        assert_eq!(frame.table.page_count(), 1);
    }

    #[test]
    fn test_wraps_before_showing_max_time() {
        let mut cycle = RenderCycle::new(loaded_store(), &PlaybackConfig::default()).unwrap();
        let times: Vec<String> = (0..4).map(|i| cycle.tick(i).unwrap().time.to_string()).collect();
        assert_eq!(
            times,
            [
                "2024-01-01 00:00:59",
                "2024-01-01 00:01:00",
                "2024-01-01 00:01:01",
                "2024-01-01 00:00:58",
            ]
        );
    }

    #[test]
    fn test_tick_count_is_only_a_label() {
        let mut a = RenderCycle::new(loaded_store(), &PlaybackConfig::default()).unwrap();
        let mut b = RenderCycle::new(loaded_store(), &PlaybackConfig::default()).unwrap();
        let fa = a.tick(0).unwrap();
        let fb = b.tick(999).unwrap();
        assert_eq!(fa.time, fb.time);
        assert_eq!(fa.table, fb.table);
        assert_eq!(fb.tick, 999);
    }

    #[test]
    fn test_page_size_comes_from_config() {
        let config = PlaybackConfig {
            page_size: 2,
            day_rollover: DayRollover::AdvanceDate,
            ..PlaybackConfig::default()
        };
        let cycle = RenderCycle::new(loaded_store(), &config).unwrap();
        let frame = cycle.frame_at(0, ts("2024-01-01 00:01:00")).unwrap();
        assert_eq!(frame.table.page_count(), 2);
        assert_eq!(frame.table.page(1).len(), 1);
    }

    #[test]
    fn test_empty_store_cannot_start() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        let result = RenderCycle::new(store, &PlaybackConfig::default());
        assert!(matches!(result, Err(StoreError::EmptyTimeline)));
    }

    #[test]
    fn test_frame_serializes_clock_label() {
        let cycle = RenderCycle::new(loaded_store(), &PlaybackConfig::default()).unwrap();
        let frame = cycle.frame_at(7, ts("2024-01-01 00:00:58")).unwrap();
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["time"], "2024-01-01 00:00:58");
        assert_eq!(json["tick"], 7);
        assert_eq!(json["scatter"]["series"][0]["name"], "drone");
    }
}
