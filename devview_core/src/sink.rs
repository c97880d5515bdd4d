//! Frame sinks - the display surfaces a render cycle feeds.
//!
//! Always available:
//! - [`LogSink`]: clock label and device count as tracing events
//! - [`JsonLinesSink`]: one JSON document per frame
//!
//! Behind features:
//! - `dashboard`: `ChannelSink` feeding the terminal dashboard
//! - `visualization`: `RerunVisualizer`

use std::io::Write;

use thiserror::Error;
use tracing::{debug, info};

use crate::cycle::RenderFrame;

/// Errors raised while presenting a frame.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// The receiving side went away (e.g. the dashboard was closed)
    #[error("frame receiver disconnected")]
    Disconnected,

    #[error("visualization error: {0}")]
    Visualization(String),
}

/// A display surface for rendered frames.
pub trait FrameSink {
    fn present(&mut self, frame: &RenderFrame) -> Result<(), SinkError>;
}

impl<T: FrameSink + ?Sized> FrameSink for Box<T> {
    fn present(&mut self, frame: &RenderFrame) -> Result<(), SinkError> {
        (**self).present(frame)
    }
}

/// Reports each frame through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl FrameSink for LogSink {
    fn present(&mut self, frame: &RenderFrame) -> Result<(), SinkError> {
        info!(
            tick = frame.tick,
            time = %frame.time,
            devices = frame.table.len(),
            series = frame.scatter.series.len(),
            "frame"
        );
        for row in frame.table.rows() {
            debug!(
                device_id = %row.device_id,
                x = row.x_pos,
                y = row.y_pos,
                z = row.z_pos,
                device_type = %row.device_type,
                "sample"
            );
        }
        Ok(())
    }
}

/// Writes each frame as a single line of JSON.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn present(&mut self, frame: &RenderFrame) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.out, frame)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{SceneLayout, ScatterView, TableView};

    fn empty_frame(tick: u64) -> RenderFrame {
        RenderFrame {
            tick,
            time: "2024-01-01 00:00:00".parse().unwrap(),
            table: TableView::from_samples(&[], 10),
            scatter: ScatterView::from_samples(&[], SceneLayout::default()),
        }
    }

    #[test]
    fn test_json_lines_one_line_per_frame() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.present(&empty_frame(0)).unwrap();
        sink.present(&empty_frame(1)).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["tick"], 1);
        assert_eq!(second["time"], "2024-01-01 00:00:00");
    }

    #[test]
    fn test_log_sink_never_fails() {
        let mut sinks: Vec<Box<dyn FrameSink>> = vec![Box::new(LogSink)];
        for sink in &mut sinks {
            sink.present(&empty_frame(3)).unwrap();
        }
    }
}
