//! Deterministic replay scene for the demo binary and end-to-end tests.
//!
//! Synthesizes a 1280x720 intersection approach: three cruising lanes with
//! id churn as cars leave and new ones enter, a bus braking to a stall, a
//! head-on pair closing on each other, a slow rear-end drift that ends with
//! overlapping boxes, and a motorcycle riding down through the stop line.

use trajectory_store::{BBox, Detection, TrackId, VehicleClass};

pub const FRAME_WIDTH: f32 = 1280.0;
pub const FRAME_HEIGHT: f32 = 720.0;
pub const TOTAL_FRAMES: u64 = 240;
pub const FRAME_INTERVAL: f64 = 1.0 / 30.0;

fn vehicle(id: TrackId, class: VehicleClass, cx: f32, cy: f32, w: f32, h: f32) -> Detection {
    let bbox = BBox::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0);
    Detection::new(id, class, bbox, 0.9)
}

/// Detections for one frame of the replay scene.
pub fn scene(frame: u64) -> Vec<Detection> {
    let f = frame as f32;
    let mut detections = Vec::new();

    // Cruising lanes. Each car runs off the right edge after 120 frames and
    // a new vehicle (fresh track id) enters on the left.
    for lane in 0..3u64 {
        let phase = frame * 10 + lane * 400;
        let lap = phase / 1200;
        let x = 40.0 + (phase % 1200) as f32;
        let y = 150.0 + 50.0 * lane as f32;
        let id = 10 * (lane + 1) + lap;
        detections.push(vehicle(id, VehicleClass::Car, x, y, 40.0, 30.0));
    }

    // Bus braking to a dead stop, blocking its lane for the rest of the run.
    let bus_x = if frame < 40 { 100.0 + 8.0 * f } else { 420.0 };
    detections.push(vehicle(50, VehicleClass::Bus, bus_x, 500.0, 80.0, 40.0));

    // Head-on pair in adjacent lanes, each leaving the frame after the pass.
    let east_x = 100.0 + 6.0 * f;
    let west_x = 1100.0 - 6.0 * f;
    if east_x < 1240.0 {
        detections.push(vehicle(60, VehicleClass::Car, east_x, 600.0, 40.0, 30.0));
    }
    if west_x > 40.0 {
        detections.push(vehicle(61, VehicleClass::Car, west_x, 620.0, 40.0, 30.0));
    }

    // Parked car and a second one drifting into its tail until the boxes
    // overlap heavily.
    detections.push(vehicle(70, VehicleClass::Car, 800.0, 660.0, 40.0, 30.0));
    let drift_x = (900.0 - f).max(802.0);
    detections.push(vehicle(71, VehicleClass::Car, drift_x, 660.0, 40.0, 30.0));

    // Motorcycle heading down through the stop line, gone once it reaches
    // the bottom of the frame.
    let moto_y = 400.0 + 2.0 * f;
    if moto_y < 700.0 {
        detections.push(vehicle(90, VehicleClass::Motorcycle, 640.0, moto_y, 30.0, 20.0));
    }

    // The tracker occasionally reports an unconfirmed box; components must
    // ignore it.
    if frame % 30 == 0 {
        let bbox = BBox::new(600.0, 80.0, 640.0, 110.0);
        detections.push(Detection::unconfirmed(VehicleClass::Unknown, bbox, 0.35));
    }

    detections
}
