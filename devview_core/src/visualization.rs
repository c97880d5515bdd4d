//! Visualization module for DevView using Rerun.io
//!
//! Streams every rendered frame to a Rerun viewer (or an `.rrd` file):
//! - One `Points3D` entity per device type under `world/devices/<type>`
//! - The fixed viewport as a static wireframe box
//! - The clock label as a `TextLog` on the `tick` timeline
//!
//! Enable with the `visualization` feature flag.

use std::collections::HashSet;

use rerun::{
    Color, EntityPath, EntityPathPart, Points3D, Radius, RecordingStream, RecordingStreamBuilder,
};
use tracing::debug;

use crate::cycle::RenderFrame;
use crate::sink::{FrameSink, SinkError};
use crate::views::Viewport;

const SERIES_COLORS: [[u8; 3]; 6] = [
    [255, 100, 100], // Red
    [100, 100, 255], // Blue
    [255, 255, 100], // Yellow
    [100, 255, 255], // Cyan
    [255, 100, 255], // Magenta
    [255, 165, 0],   // Orange
];

fn to_sink_error(e: impl std::fmt::Display) -> SinkError {
    SinkError::Visualization(e.to_string())
}

/// Entity path of a device type's series.
///
/// The type name is kept verbatim as a single path part, so distinct names
/// always map to distinct entities.
fn series_path(name: &str) -> EntityPath {
    EntityPath::new(vec![
        EntityPathPart::new("world"),
        EntityPathPart::new("devices"),
        EntityPathPart::new(name),
    ])
}

/// What one call to `present` wrote to the stream.
#[derive(Debug, Default, PartialEq)]
struct LoggedFrame {
    viewport: bool,
    points: Vec<EntityPath>,
    cleared: Vec<EntityPath>,
}

/// Rerun-based display surface for playback frames
pub struct RerunVisualizer {
    rec: RecordingStream,
    /// Series logged on the previous frame, cleared when they disappear
    live_series: HashSet<EntityPath>,
    viewport_logged: bool,
}

impl RerunVisualizer {
    /// Create a new visualizer that spawns the Rerun viewer
    pub fn new(app_id: &str) -> Result<Self, SinkError> {
        let rec = RecordingStreamBuilder::new(app_id)
            .spawn()
            .map_err(to_sink_error)?;
        Self::with_stream(rec)
    }

    /// Create a visualizer that saves to a file
    pub fn new_to_file(app_id: &str, path: &str) -> Result<Self, SinkError> {
        let rec = RecordingStreamBuilder::new(app_id)
            .save(path)
            .map_err(to_sink_error)?;
        Self::with_stream(rec)
    }

    /// Wrap an already configured recording stream.
    pub fn with_stream(rec: RecordingStream) -> Result<Self, SinkError> {
        rec.log_static("world", &rerun::ViewCoordinates::RIGHT_HAND_Z_UP())
            .map_err(to_sink_error)?;
        Ok(Self {
            rec,
            live_series: HashSet::new(),
            viewport_logged: false,
        })
    }

    fn log_viewport(&self, viewport: &Viewport) -> Result<(), SinkError> {
        let min = viewport.min as f32;
        let size = viewport.size() as f32;
        self.rec
            .log_static(
                "world/viewport",
                &rerun::Boxes3D::from_mins_and_sizes([[min, min, min]], [[size, size, size]])
                    .with_colors([Color::from_rgb(90, 90, 90)]),
            )
            .map_err(to_sink_error)
    }

    fn log_frame(&mut self, frame: &RenderFrame) -> Result<LoggedFrame, SinkError> {
        let scatter = &frame.scatter;
        let mut logged = LoggedFrame::default();

        if !self.viewport_logged {
            self.log_viewport(&scatter.layout.viewport)?;
            self.viewport_logged = true;
            logged.viewport = true;
        }

        self.rec.set_time_sequence("tick", frame.tick as i64);

        let mut live = HashSet::with_capacity(scatter.series.len());
        for (i, series) in scatter.series.iter().enumerate() {
            let (positions, labels): (Vec<[f32; 3]>, Vec<String>) = scatter
                .visible_points(series)
                .map(|p| {
                    (
                        [p.position.x as f32, p.position.y as f32, p.position.z as f32],
                        p.device_id.clone(),
                    )
                })
                .unzip();

            let [r, g, b] = SERIES_COLORS[i % SERIES_COLORS.len()];
            let path = series_path(&series.name);
            self.rec
                .log(
                    path.clone(),
                    &Points3D::new(positions)
                        .with_colors([Color::from_rgb(r, g, b)])
                        .with_radii([Radius::new_ui_points(scatter.layout.marker_size as f32)])
                        .with_labels(labels),
                )
                .map_err(to_sink_error)?;
            live.insert(path.clone());
            logged.points.push(path);
        }

        // Device types with no samples this second
        for stale in self.live_series.difference(&live) {
            self.rec
                .log(stale.clone(), &rerun::Clear::flat())
                .map_err(to_sink_error)?;
            logged.cleared.push(stale.clone());
        }
        self.live_series = live;

        self.rec
            .log(
                "logs/clock",
                &rerun::TextLog::new(format!("{} ({} devices)", frame.time, frame.table.len())),
            )
            .map_err(to_sink_error)?;

        Ok(logged)
    }
}

impl FrameSink for RerunVisualizer {
    fn present(&mut self, frame: &RenderFrame) -> Result<(), SinkError> {
        let logged = self.log_frame(frame)?;
        debug!(
            tick = frame.tick,
            series = logged.points.len(),
            cleared = logged.cleared.len(),
            "frame sent to Rerun"
        );
        Ok(())
    }
}
