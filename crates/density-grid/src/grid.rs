//! Grid accumulator and queries

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;
use tracing::debug;
use trajectory_store::{BBox, Detection};

/// Grid construction errors
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Cell size must be positive")]
    ZeroCellSize,

    #[error("Frame dimensions must be positive: {0}x{1}")]
    EmptyFrame(u32, u32),
}

/// Density grid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Cell edge length in pixels.
    pub cell_size: u32,
    /// Per-frame multiplier applied to the temporal layer.
    pub decay: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            frame_width: 1280,
            frame_height: 720,
            cell_size: 32,
            decay: 0.95,
        }
    }
}

/// One cell whose normalized density exceeded the query threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Hotspot {
    pub grid_x: usize,
    pub grid_y: usize,
    pub pixel_x: u32,
    pub pixel_y: u32,
    /// Density relative to the grid's current maximum, in (0, 1].
    pub density: f32,
    /// Pixel-space rectangle covered by the cell.
    pub bounds: BBox,
}

/// Mean raw density per 3x3 macro-region of the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionalCongestion {
    pub top_left: f32,
    pub top_center: f32,
    pub top_right: f32,
    pub mid_left: f32,
    pub mid_center: f32,
    pub mid_right: f32,
    pub bottom_left: f32,
    pub bottom_center: f32,
    pub bottom_right: f32,
}

/// Occupancy accumulator over frame space.
///
/// `density` only ever grows until `reset()`; `temporal` decays by the
/// configured factor each update, so its mass follows current traffic.
pub struct DensityGrid {
    config: GridConfig,
    cols: usize,
    rows: usize,
    density: Array2<f32>,
    temporal: Array2<f32>,
}

impl DensityGrid {
    /// Build a grid covering the frame, rounding dimensions up so edge
    /// pixels always land in a cell.
    pub fn new(config: GridConfig) -> Result<Self, GridError> {
        if config.cell_size == 0 {
            return Err(GridError::ZeroCellSize);
        }
        if config.frame_width == 0 || config.frame_height == 0 {
            return Err(GridError::EmptyFrame(config.frame_width, config.frame_height));
        }

        let cols = config.frame_width.div_ceil(config.cell_size) as usize;
        let rows = config.frame_height.div_ceil(config.cell_size) as usize;
        debug!(rows, cols, cell_size = config.cell_size, "density grid ready");

        Ok(Self {
            config,
            cols,
            rows,
            density: Array2::zeros((rows, cols)),
            temporal: Array2::zeros((rows, cols)),
        })
    }

    /// Decay the temporal layer, then mark every identified detection's
    /// center cell in both layers.
    pub fn update(&mut self, detections: &[Detection]) {
        self.temporal *= self.config.decay;

        for detection in detections {
            if detection.track_id.is_none() {
                continue;
            }
            let center = detection.bbox.center();
            let (row, col) = self.cell_of(center.x, center.y);
            self.density[[row, col]] += 1.0;
            self.temporal[[row, col]] += 1.0;
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cumulative occupancy counts.
    pub fn density(&self) -> &Array2<f32> {
        &self.density
    }

    /// Decayed recent-occupancy layer.
    pub fn temporal(&self) -> &Array2<f32> {
        &self.temporal
    }

    /// Density scaled by its current maximum; all zeros when nothing has
    /// been observed.
    pub fn normalized(&self) -> Array2<f32> {
        Self::max_normalize(&self.density)
    }

    /// Temporal layer scaled by its current maximum.
    pub fn temporal_normalized(&self) -> Array2<f32> {
        Self::max_normalize(&self.temporal)
    }

    /// Cells whose normalized density exceeds `threshold`, busiest first.
    pub fn hotspots(&self, threshold: f32) -> Vec<Hotspot> {
        let normalized = self.normalized();
        let cell = self.config.cell_size;

        let mut spots: Vec<Hotspot> = normalized
            .indexed_iter()
            .filter(|&(_, &value)| value > threshold)
            .map(|((row, col), &value)| {
                let pixel_x = col as u32 * cell;
                let pixel_y = row as u32 * cell;
                Hotspot {
                    grid_x: col,
                    grid_y: row,
                    pixel_x,
                    pixel_y,
                    density: value,
                    bounds: BBox::new(
                        pixel_x as f32,
                        pixel_y as f32,
                        (pixel_x + cell) as f32,
                        (pixel_y + cell) as f32,
                    ),
                }
            })
            .collect();

        spots.sort_by(|a, b| b.density.partial_cmp(&a.density).unwrap_or(Ordering::Equal));
        spots
    }

    /// Mean raw density per 3x3 macro-region. Band boundaries use integer
    /// division; the last band absorbs any remainder rows/columns.
    pub fn regional_congestion(&self) -> RegionalCongestion {
        let rh = self.rows / 3;
        let rw = self.cols / 3;

        let mean = |r0: usize, r1: usize, c0: usize, c1: usize| -> f32 {
            self.density
                .slice(s![r0..r1, c0..c1])
                .mean()
                .unwrap_or(0.0)
        };

        RegionalCongestion {
            top_left: mean(0, rh, 0, rw),
            top_center: mean(0, rh, rw, 2 * rw),
            top_right: mean(0, rh, 2 * rw, self.cols),
            mid_left: mean(rh, 2 * rh, 0, rw),
            mid_center: mean(rh, 2 * rh, rw, 2 * rw),
            mid_right: mean(rh, 2 * rh, 2 * rw, self.cols),
            bottom_left: mean(2 * rh, self.rows, 0, rw),
            bottom_center: mean(2 * rh, self.rows, rw, 2 * rw),
            bottom_right: mean(2 * rh, self.rows, 2 * rw, self.cols),
        }
    }

    /// Zero both layers. The only way cumulative density ever shrinks.
    pub fn reset(&mut self) {
        self.density.fill(0.0);
        self.temporal.fill(0.0);
    }

    fn cell_of(&self, x: f32, y: f32) -> (usize, usize) {
        let cell = self.config.cell_size as f32;
        let col = (x / cell).floor() as i64;
        let row = (y / cell).floor() as i64;
        (
            row.clamp(0, self.rows as i64 - 1) as usize,
            col.clamp(0, self.cols as i64 - 1) as usize,
        )
    }

    fn max_normalize(layer: &Array2<f32>) -> Array2<f32> {
        let max = layer.iter().fold(0.0f32, |acc, &v| acc.max(v));
        if max > 0.0 {
            layer / max
        } else {
            layer.clone()
        }
    }
}
