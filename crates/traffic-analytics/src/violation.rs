use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trajectory_store::{TrackId, VehicleClass};

/// Rule a track was observed breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Vertical bbox center moved past the configured stop line.
    CrossingStopLine,
}

impl ViolationKind {
    pub fn label(&self) -> &'static str {
        match self {
            ViolationKind::CrossingStopLine => "crossing_stop_line",
        }
    }
}

/// One logged violation, stamped at detection time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub track_id: TrackId,
    pub kind: ViolationKind,
    pub class: VehicleClass,
    pub timestamp: DateTime<Utc>,
}

impl Violation {
    pub fn new(track_id: TrackId, kind: ViolationKind, class: VehicleClass) -> Self {
        Self {
            track_id,
            kind,
            class,
            timestamp: Utc::now(),
        }
    }
}
