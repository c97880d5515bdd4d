//! Frame projections - the table view and the 3D scatter view.
//!
//! Both views are pure functions of the sample set for one timestamp plus
//! static layout. Nothing here is derived from the data range: the scatter
//! viewport and camera are fixed, and points outside the viewport are left
//! for the renderer to clip.

use std::collections::HashMap;

use nalgebra::Vector3;
use serde::Serialize;

use crate::sample::PositionSample;

// =============================================================================
// TABLE VIEW
// =============================================================================

/// Column headers of the device table, in display order.
pub const TABLE_COLUMNS: [&str; 5] = [
    "Device ID",
    "X Position",
    "Y Position",
    "Z Position",
    "Device Type",
];

/// One table row: a sample without its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub device_id: String,
    pub x_pos: f64,
    pub y_pos: f64,
    pub z_pos: f64,
    pub device_type: String,
}

impl TableRow {
    /// Display text for each column of [`TABLE_COLUMNS`].
    pub fn cells(&self) -> [String; 5] {
        [
            self.device_id.clone(),
            self.x_pos.to_string(),
            self.y_pos.to_string(),
            self.z_pos.to_string(),
            self.device_type.clone(),
        ]
    }
}

impl From<&PositionSample> for TableRow {
    fn from(sample: &PositionSample) -> Self {
        Self {
            device_id: sample.device_id.clone(),
            x_pos: sample.x_pos,
            y_pos: sample.y_pos,
            z_pos: sample.z_pos,
            device_type: sample.device_type.clone(),
        }
    }
}

/// Paginated five-column projection of a sample set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    rows: Vec<TableRow>,
    page_size: usize,
}

impl TableView {
    pub fn from_samples(samples: &[PositionSample], page_size: usize) -> Self {
        Self {
            rows: samples.iter().map(TableRow::from).collect(),
            page_size: page_size.max(1),
        }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages; an empty table still has one (empty) page.
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.page_size).max(1)
    }

    /// Rows on page `index` (zero based). Out-of-range pages are empty.
    pub fn page(&self, index: usize) -> &[TableRow] {
        let start = index.saturating_mul(self.page_size).min(self.rows.len());
        let end = start.saturating_add(self.page_size).min(self.rows.len());
        &self.rows[start..end]
    }
}

// =============================================================================
// SCENE LAYOUT (static)
// =============================================================================

/// Cubic viewport, the same `[min, max]` range on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub min: f64,
    pub max: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { min: 0.0, max: 25.0 }
    }
}

impl Viewport {
    pub fn size(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> Vector3<f64> {
        let mid = (self.min + self.max) / 2.0;
        Vector3::new(mid, mid, mid)
    }

    /// Whether `point` is inside the cube (bounds inclusive).
    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        point.iter().all(|c| (self.min..=self.max).contains(c))
    }

    /// The eight corners of the cube.
    pub fn corners(&self) -> [Vector3<f64>; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vector3::new(lo, lo, lo),
            Vector3::new(hi, lo, lo),
            Vector3::new(lo, hi, lo),
            Vector3::new(hi, hi, lo),
            Vector3::new(lo, lo, hi),
            Vector3::new(hi, lo, hi),
            Vector3::new(lo, hi, hi),
            Vector3::new(hi, hi, hi),
        ]
    }
}

/// Fixed camera: looks from `eye` toward `center`, z axis up.
///
/// Only the viewing direction matters for the orthographic projection used
/// by the terminal dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    pub center: Vector3<f64>,
    pub eye: Vector3<f64>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: Vector3::zeros(),
            eye: Vector3::new(0.2, 0.2, 0.2),
        }
    }
}

impl Camera {
    /// Screen-space (right, up) unit vectors.
    fn basis(&self) -> (Vector3<f64>, Vector3<f64>) {
        let forward = (self.center - self.eye)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(|| -Vector3::z());
        let right = forward
            .cross(&Vector3::z())
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(|| Vector3::x());
        let up = right.cross(&forward);
        (right, up)
    }

    /// Orthographic projection of `point` onto the screen plane, relative
    /// to `pivot` (which lands on the origin).
    pub fn project(&self, point: &Vector3<f64>, pivot: &Vector3<f64>) -> [f64; 2] {
        let (right, up) = self.basis();
        let rel = point - pivot;
        [rel.dot(&right), rel.dot(&up)]
    }

    /// Screen-space `(x_bounds, y_bounds)` that fit the whole viewport cube.
    pub fn projected_bounds(&self, viewport: &Viewport) -> ([f64; 2], [f64; 2]) {
        let pivot = viewport.center();
        let mut x = [f64::MAX, f64::MIN];
        let mut y = [f64::MAX, f64::MIN];
        for corner in viewport.corners() {
            let [px, py] = self.project(&corner, &pivot);
            x = [x[0].min(px), x[1].max(px)];
            y = [y[0].min(py), y[1].max(py)];
        }
        (x, y)
    }
}

/// Static scatter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SceneLayout {
    /// Marker size, identical for every series
    pub marker_size: f64,
    pub viewport: Viewport,
    pub camera: Camera,
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            marker_size: 5.0,
            viewport: Viewport::default(),
            camera: Camera::default(),
        }
    }
}

// =============================================================================
// SCATTER VIEW
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub device_id: String,
    pub position: Vector3<f64>,
}

/// All markers of one device type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    /// The device type this series draws
    pub name: String,
    pub points: Vec<ScatterPoint>,
}

/// Device positions grouped by type, plus the static scene layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterView {
    pub series: Vec<ScatterSeries>,
    pub layout: SceneLayout,
}

impl ScatterView {
    /// Group samples by `device_type`, series ordered by first appearance.
    pub fn from_samples(samples: &[PositionSample], layout: SceneLayout) -> Self {
        let mut series: Vec<ScatterSeries> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for sample in samples {
            let slot = *index.entry(sample.device_type.as_str()).or_insert_with(|| {
                series.push(ScatterSeries {
                    name: sample.device_type.clone(),
                    points: Vec::new(),
                });
                series.len() - 1
            });
            series[slot].points.push(ScatterPoint {
                device_id: sample.device_id.clone(),
                position: sample.position(),
            });
        }

        Self { series, layout }
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    /// Points of `series` that fall inside the viewport.
    pub fn visible_points<'a>(
        &'a self,
        series: &'a ScatterSeries,
    ) -> impl Iterator<Item = &'a ScatterPoint> + 'a {
        series
            .points
            .iter()
            .filter(move |p| self.layout.viewport.contains(&p.position))
    }

    /// Visible points of `series` projected through the camera.
    pub fn projected<'a>(
        &'a self,
        series: &'a ScatterSeries,
    ) -> impl Iterator<Item = (f64, f64)> + 'a {
        let pivot = self.layout.viewport.center();
        self.visible_points(series).map(move |p| {
            let [x, y] = self.layout.camera.project(&p.position, &pivot);
            (x, y)
        })
    }
}
