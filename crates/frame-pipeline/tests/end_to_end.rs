//! Full-pipeline checks over synthetic frame sequences.

use std::collections::HashSet;

use frame_pipeline::scenario::{scene, FRAME_INTERVAL, TOTAL_FRAMES};
use frame_pipeline::{PipelineConfig, TrafficPipeline};
use incident_detector::IncidentKind;
use trajectory_store::{BBox, Detection, TrackId, VehicleClass};

fn car(id: TrackId, cx: f32, cy: f32) -> Detection {
    let bbox = BBox::new(cx - 20.0, cy - 15.0, cx + 20.0, cy + 15.0);
    Detection::new(id, VehicleClass::Car, bbox, 0.9)
}

#[test]
fn test_three_frame_cruise_yields_speed_record() {
    let mut pipeline = TrafficPipeline::new(PipelineConfig::default()).unwrap();
    for frame in 0..3u64 {
        let dets = vec![car(1, 100.0 + 10.0 * frame as f32, 200.0)];
        pipeline.process_frame(frame as f64 * FRAME_INTERVAL, &dets);
    }
    let record = pipeline.speeds().speed(1).expect("three samples give a record");
    assert!((record.speed_per_frame - 10.0).abs() < 1e-6);
    assert!(record.direction_radians.abs() < 1e-9);
    assert!(record.stability > 0.99);
}

#[test]
fn test_vanished_track_purged_from_components() {
    let mut pipeline = TrafficPipeline::new(PipelineConfig::default()).unwrap();
    for frame in 0..12u64 {
        let x = 100.0 + 10.0 * frame as f32;
        let dets = vec![car(1, x, 200.0), car(2, x, 300.0)];
        pipeline.process_frame(frame as f64 * FRAME_INTERVAL, &dets);
    }
    assert!(pipeline.store().contains(2));
    assert!(pipeline.speeds().speed(2).is_some());

    for frame in 12..14u64 {
        let dets = vec![car(1, 100.0 + 10.0 * frame as f32, 200.0)];
        pipeline.process_frame(frame as f64 * FRAME_INTERVAL, &dets);
    }
    assert!(!pipeline.store().contains(2));
    assert!(pipeline.speeds().speed(2).is_none());
    assert!(pipeline.store().contains(1));
}

#[test]
fn test_unconfirmed_detections_never_enter_the_store() {
    let mut pipeline = TrafficPipeline::new(PipelineConfig::default()).unwrap();
    let bbox = BBox::new(80.0, 180.0, 120.0, 220.0);
    let dets = vec![
        car(1, 100.0, 300.0),
        Detection::unconfirmed(VehicleClass::Car, bbox, 0.4),
    ];
    let analysis = pipeline.process_frame(0.0, &dets);
    assert_eq!(pipeline.store().len(), 1);
    assert_eq!(analysis.snapshot.active_tracks, 1);
    assert_eq!(analysis.snapshot.class_counts.total(), 1);
}

#[test]
fn test_congestion_level_saturates_at_capacity() {
    let config = PipelineConfig {
        congestion_capacity: 4,
        ..PipelineConfig::default()
    };
    let mut pipeline = TrafficPipeline::new(config).unwrap();
    let dets: Vec<Detection> = (1..=8u64).map(|id| car(id, 60.0 * id as f32, 200.0)).collect();
    let analysis = pipeline.process_frame(0.0, &dets);
    assert_eq!(analysis.congestion_level, 1.0);

    let half: Vec<Detection> = dets.into_iter().take(2).collect();
    let analysis = pipeline.process_frame(FRAME_INTERVAL, &half);
    assert_eq!(analysis.congestion_level, 0.5);
}

#[test]
fn test_degenerate_grid_config_rejected() {
    let mut config = PipelineConfig::default();
    config.grid.cell_size = 0;
    assert!(TrafficPipeline::new(config).is_err());
}

#[test]
fn test_replay_scene_produces_expected_events() {
    let mut pipeline = TrafficPipeline::new(PipelineConfig::default()).unwrap();
    let mut saw_collision = false;
    let mut saw_stall = false;
    let mut saw_accident = false;
    let mut saw_violation = false;
    let mut saw_forecast = false;
    let mut last = None;

    for frame in 0..TOTAL_FRAMES {
        let analysis = pipeline.process_frame(frame as f64 * FRAME_INTERVAL, &scene(frame));
        saw_collision |= !analysis.collision_alerts.is_empty();
        saw_stall |= analysis
            .incidents
            .iter()
            .any(|i| matches!(i.kind, IncidentKind::StalledVehicle { .. }));
        saw_accident |= analysis
            .incidents
            .iter()
            .any(|i| matches!(i.kind, IncidentKind::PotentialAccident { .. }));
        saw_violation |= !analysis.snapshot.violations.is_empty();
        saw_forecast |= analysis.congestion.is_some();
        last = Some(analysis);
    }

    assert!(saw_collision, "head-on pair never raised a collision alert");
    assert!(saw_stall, "stopped bus never raised a stall incident");
    assert!(saw_accident, "rear-end overlap never raised an accident");
    assert!(saw_violation, "motorcycle never logged a stop-line crossing");
    assert!(saw_forecast, "predictor never warmed up");

    let last = last.unwrap();
    assert!(last.congestion_level > 0.0 && last.congestion_level <= 1.0);
    assert!(last.snapshot.peak_active >= last.snapshot.active_tracks);
    assert!(last.snapshot.risk_index >= 0.0 && last.snapshot.risk_index <= 100.0);
    assert!(!pipeline.density().hotspots(0.5).is_empty());

    // Stationary vehicles dominate the cumulative grid around their cells.
    let regions = pipeline.density().regional_congestion();
    assert!(regions.bottom_center > 0.0);
}

#[test]
fn test_replay_scene_track_ids_purged_after_exit() {
    let mut pipeline = TrafficPipeline::new(PipelineConfig::default()).unwrap();
    for frame in 0..TOTAL_FRAMES {
        pipeline.process_frame(frame as f64 * FRAME_INTERVAL, &scene(frame));
    }
    // The first-lap cruisers and the departed head-on pair are gone.
    for id in [10u64, 20, 30, 60, 61, 90] {
        assert!(!pipeline.store().contains(id), "track {id} still stored");
    }
    let remaining: HashSet<TrackId> = pipeline.store().track_ids().collect();
    assert!(remaining.contains(&50));
    assert!(remaining.contains(&70));
}
