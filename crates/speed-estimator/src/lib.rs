//! Speed & Direction Estimator
//!
//! Derives per-track velocity, heading, and stability from the shared
//! trajectory store. The displacement statistics in [`stats`] are also the
//! canonical erratic-motion signal: the incident detector and the analytics
//! risk index both consume the same computation rather than keeping two
//! diverging copies.

pub mod stats;

mod estimator;

pub use estimator::{SpeedConfig, SpeedEstimator, SpeedHistogram, SpeedRecord};
