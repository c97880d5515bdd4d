//! Playback configuration.

use std::time::Duration;

use crate::timeline::DayRollover;
use crate::views::SceneLayout;

/// Configuration for a playback session.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Timer period between ticks (default: 1000 ms)
    pub period: Duration,

    /// Table rows per page (default: 10)
    pub page_size: usize,

    /// Scatter marker size, viewport and camera
    pub scene: SceneLayout,

    /// Date handling past 23:59:59 (default: wrap within the day)
    pub day_rollover: DayRollover,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(1000),
            page_size: 10,
            scene: SceneLayout::default(),
            day_rollover: DayRollover::WrapWithinDay,
        }
    }
}
