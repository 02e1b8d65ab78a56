//! Tracked detections handed over by the upstream detector + tracker

use crate::geometry::BBox;
use crate::TrackId;
use serde::{Deserialize, Serialize};

/// Vehicle taxonomy. `Unknown` absorbs any label outside the fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Car,
    Bus,
    Truck,
    Motorcycle,
    Bicycle,
    #[default]
    Unknown,
}

impl VehicleClass {
    /// Every class in a fixed order, for per-class tables.
    pub const ALL: [VehicleClass; 6] = [
        VehicleClass::Car,
        VehicleClass::Bus,
        VehicleClass::Truck,
        VehicleClass::Motorcycle,
        VehicleClass::Bicycle,
        VehicleClass::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Bus => "bus",
            VehicleClass::Truck => "truck",
            VehicleClass::Motorcycle => "motorcycle",
            VehicleClass::Bicycle => "bicycle",
            VehicleClass::Unknown => "unknown",
        }
    }

    /// Map an upstream label onto the taxonomy; anything else is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "car" => VehicleClass::Car,
            "bus" => VehicleClass::Bus,
            "truck" => VehicleClass::Truck,
            "motorcycle" => VehicleClass::Motorcycle,
            "bicycle" => VehicleClass::Bicycle,
            _ => VehicleClass::Unknown,
        }
    }
}

/// One detection in the current frame.
///
/// `track_id` is `None` while the tracker has not confirmed a stable
/// identity; every component skips those detections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub track_id: Option<TrackId>,
    pub class: VehicleClass,
    pub bbox: BBox,
    /// Detector confidence, clamped to [0, 1] at construction.
    pub confidence: f32,
}

impl Detection {
    /// A confirmed detection with a stable track identity.
    pub fn new(track_id: TrackId, class: VehicleClass, bbox: BBox, confidence: f32) -> Self {
        Self {
            track_id: Some(track_id),
            class,
            bbox,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// A detection the tracker has not assigned an identity to yet.
    pub fn unconfirmed(class: VehicleClass, bbox: BBox, confidence: f32) -> Self {
        Self {
            track_id: None,
            class,
            bbox,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        let b = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(Detection::new(1, VehicleClass::Car, b, 1.7).confidence, 1.0);
        assert_eq!(Detection::new(1, VehicleClass::Car, b, -0.2).confidence, 0.0);
        assert_eq!(Detection::unconfirmed(VehicleClass::Bus, b, 0.4).confidence, 0.4);
    }

    #[test]
    fn test_label_round_trip() {
        for class in VehicleClass::ALL {
            assert_eq!(VehicleClass::from_label(class.label()), class);
        }
        assert_eq!(VehicleClass::from_label("skateboard"), VehicleClass::Unknown);
    }
}
