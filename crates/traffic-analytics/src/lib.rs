//! Frame-level traffic aggregation.
//!
//! Rolls per-frame detections up into the numbers an operator dashboard
//! consumes: cumulative vehicle counts per class, the active/peak track
//! watermark, a capped stop-line violation log, a composite risk index,
//! an emission estimate and a signal-timing advisory. Everything here is
//! derived state; the trajectory store remains the single owner of track
//! history.

mod aggregator;
mod emissions;
mod violation;

pub use aggregator::{
    AnalyticsConfig, AnalyticsSnapshot, SignalAdvisory, TrafficAnalytics,
};
pub use emissions::{ClassCounts, EmissionFactors};
pub use violation::{Violation, ViolationKind};
