//! Incident Detector
//!
//! Watches tracked vehicles for three conditions:
//! - Stalled vehicle: near-zero speed sustained for about a second
//! - Erratic driving: high variance in step-to-step displacement
//! - Potential accident: significant bounding-box overlap in one frame
//!
//! Current-frame incidents are transient; everything also lands in a
//! capped rolling history for dashboards and summaries.

mod detector;
mod incident;

pub use detector::{IncidentConfig, IncidentDetector, IncidentSummary};
pub use incident::{Incident, IncidentCounts, IncidentKind, Severity};
