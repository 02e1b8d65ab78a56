//! Shared Trajectory Store
//!
//! Bounded per-track position/box history, the substrate every analytics
//! component reads. Keeping trajectories in exactly one place means eviction
//! happens in exactly one place: a track that vanishes from a frame is
//! forgotten by the whole system at the end of that frame.

mod detection;
mod geometry;
mod history;
mod store;

pub use detection::{Detection, VehicleClass};
pub use geometry::{BBox, Point};
pub use history::{TrackHistory, TrackSample};
pub use store::{TrajectoryStore, DEFAULT_CAPACITY};

/// Stable identifier assigned by the upstream tracker.
pub type TrackId = u64;
