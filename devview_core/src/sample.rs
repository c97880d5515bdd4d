//! Position samples - one reading of one device at one timestamp.

use nalgebra::Vector3;
use serde::Serialize;

use crate::timeline::Timestamp;

/// A recorded device position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSample {
    /// Opaque identifier, stable per physical device
    pub device_id: String,

    pub x_pos: f64,
    pub y_pos: f64,
    pub z_pos: f64,

    /// Categorical label used for grouping and coloring (e.g. "drone", "tag")
    pub device_type: String,

    /// Second-resolution timestamp of the reading
    pub time: Timestamp,
}

impl PositionSample {
    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x_pos, self.y_pos, self.z_pos)
    }
}
