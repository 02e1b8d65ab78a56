//! Spatial Density Grid
//!
//! Accumulates vehicle occupancy over a fixed cell grid covering frame
//! space. Two layers: `density` counts occupancy since the last explicit
//! reset, `temporal` decays every frame so recent traffic dominates.
//! Queries (hotspots, regional means) derive normalized views on demand;
//! nothing normalized is ever stored.

mod grid;

pub use grid::{DensityGrid, GridConfig, GridError, Hotspot, RegionalCongestion};
