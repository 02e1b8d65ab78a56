//! Incident records

use serde::{Deserialize, Serialize};
use trajectory_store::{Point, TrackId};

/// Incident severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// What happened, with the context that makes it actionable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncidentKind {
    /// A vehicle sat nearly motionless past the stall window.
    StalledVehicle {
        track_id: TrackId,
        position: Point,
        duration_frames: u32,
    },

    /// Step displacements over the erratic window varied too much.
    ErraticDriving {
        track_id: TrackId,
        position: Point,
        variance: f64,
    },

    /// Two boxes in the same frame overlapped beyond the accident threshold.
    PotentialAccident {
        track_a: TrackId,
        track_b: TrackId,
        overlap_ratio: f32,
    },
}

impl IncidentKind {
    pub fn label(&self) -> &'static str {
        match self {
            IncidentKind::StalledVehicle { .. } => "stalled_vehicle",
            IncidentKind::ErraticDriving { .. } => "erratic_driving",
            IncidentKind::PotentialAccident { .. } => "potential_accident",
        }
    }
}

/// One detected incident.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    #[serde(flatten)]
    pub kind: IncidentKind,
    pub severity: Severity,
}

impl Incident {
    pub fn new(kind: IncidentKind, severity: Severity) -> Self {
        Self { kind, severity }
    }
}

/// Per-kind tallies over the retained history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentCounts {
    pub stalled_vehicle: usize,
    pub erratic_driving: usize,
    pub potential_accident: usize,
}

impl IncidentCounts {
    pub fn add(&mut self, kind: &IncidentKind) {
        match kind {
            IncidentKind::StalledVehicle { .. } => self.stalled_vehicle += 1,
            IncidentKind::ErraticDriving { .. } => self.erratic_driving += 1,
            IncidentKind::PotentialAccident { .. } => self.potential_accident += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.stalled_vehicle + self.erratic_driving + self.potential_accident
    }
}
