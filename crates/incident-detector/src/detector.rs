//! Per-frame incident checks

use crate::incident::{Incident, IncidentCounts, IncidentKind, Severity};
use serde::{Deserialize, Serialize};
use speed_estimator::stats::erratic_variance;
use speed_estimator::SpeedEstimator;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;
use trajectory_store::{Detection, TrackId, TrajectoryStore};

/// Incident detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentConfig {
    /// Speed (pixels per frame) below which a vehicle counts as stopped.
    pub stall_speed_threshold: f64,

    /// Consecutive stopped frames before a stall is reported.
    pub stall_frames_threshold: u32,

    /// Raw position samples the erratic check needs before it fires.
    pub erratic_window: usize,

    /// Step-displacement variance above which motion counts as erratic.
    pub erratic_variance_threshold: f64,

    /// IoU above which an overlapping pair is a potential accident.
    pub overlap_threshold: f32,

    /// IoU above which the accident is reported at high severity.
    pub severe_overlap_threshold: f32,

    /// Rolling incident history cap.
    pub history_cap: usize,
}

impl Default for IncidentConfig {
    fn default() -> Self {
        Self {
            stall_speed_threshold: 0.5,
            stall_frames_threshold: 30,
            erratic_window: 10,
            erratic_variance_threshold: 50.0,
            overlap_threshold: 0.3,
            severe_overlap_threshold: 0.5,
            history_cap: 100,
        }
    }
}

/// Dashboard-facing digest of the current frame plus retained history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentSummary {
    pub total_current: usize,
    pub high_severity: usize,
    pub counts_by_kind: IncidentCounts,
    /// Up to five of the current frame's incidents, detection order.
    pub latest: Vec<Incident>,
}

/// Detects stalls, erratic motion and box-overlap accidents.
///
/// Only the stall check carries state across frames (the per-track
/// counter); the other two are re-evaluated from scratch every frame.
pub struct IncidentDetector {
    config: IncidentConfig,
    stall_counters: HashMap<TrackId, u32>,
    current: Vec<Incident>,
    history: VecDeque<Incident>,
}

impl IncidentDetector {
    pub fn new(config: IncidentConfig) -> Self {
        Self {
            config,
            stall_counters: HashMap::new(),
            current: Vec::new(),
            history: VecDeque::new(),
        }
    }

    /// Run all three checks against the current frame.
    ///
    /// `detections` is the frame's identified detections; `store` and
    /// `speeds` must already be updated for this frame.
    pub fn update(
        &mut self,
        detections: &[Detection],
        store: &TrajectoryStore,
        speeds: &SpeedEstimator,
        active: &HashSet<TrackId>,
    ) {
        self.current.clear();
        self.stall_counters.retain(|id, _| active.contains(id));

        let mut ids: Vec<TrackId> = active.iter().copied().collect();
        ids.sort_unstable();

        self.check_stalls(&ids, store, speeds);
        self.check_erratic(&ids, store);
        self.check_overlaps(detections);

        for incident in &self.current {
            if self.history.len() >= self.config.history_cap {
                self.history.pop_front();
            }
            self.history.push_back(*incident);
        }

        if !self.current.is_empty() {
            debug!(incidents = self.current.len(), "incidents this frame");
        }
    }

    /// Incidents detected in the most recent frame.
    pub fn incidents(&self) -> &[Incident] {
        &self.current
    }

    /// Retained incident history, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Incident> {
        self.history.iter()
    }

    pub fn summary(&self) -> IncidentSummary {
        let mut counts = IncidentCounts::default();
        for incident in &self.history {
            counts.add(&incident.kind);
        }

        IncidentSummary {
            total_current: self.current.len(),
            high_severity: self
                .current
                .iter()
                .filter(|i| i.severity == Severity::High)
                .count(),
            counts_by_kind: counts,
            latest: self.current.iter().take(5).copied().collect(),
        }
    }

    /// A track stopped below the speed threshold accrues one counter tick
    /// per frame; past the frame threshold every further stopped frame
    /// re-reports the stall with its running duration. Any speed above the
    /// threshold clears the counter outright.
    fn check_stalls(&mut self, ids: &[TrackId], store: &TrajectoryStore, speeds: &SpeedEstimator) {
        for &id in ids {
            let record = match speeds.speed(id) {
                Some(record) => record,
                None => continue,
            };

            if record.speed_per_frame < self.config.stall_speed_threshold {
                let counter = self.stall_counters.entry(id).or_insert(0);
                *counter += 1;
                let duration_frames = *counter;

                if duration_frames > self.config.stall_frames_threshold {
                    if let Some(sample) = store.latest(id) {
                        debug!(track_id = id, duration_frames, "stalled vehicle");
                        self.current.push(Incident::new(
                            IncidentKind::StalledVehicle {
                                track_id: id,
                                position: sample.center,
                                duration_frames,
                            },
                            Severity::High,
                        ));
                    }
                }
            } else {
                self.stall_counters.remove(&id);
            }
        }
    }

    fn check_erratic(&mut self, ids: &[TrackId], store: &TrajectoryStore) {
        for &id in ids {
            let samples = store.history(id, self.config.erratic_window);
            let variance = match erratic_variance(&samples, self.config.erratic_window) {
                Some(variance) => variance,
                None => continue,
            };

            if variance > self.config.erratic_variance_threshold {
                if let Some(last) = samples.last() {
                    self.current.push(Incident::new(
                        IncidentKind::ErraticDriving {
                            track_id: id,
                            position: last.center,
                            variance,
                        },
                        Severity::Medium,
                    ));
                }
            }
        }
    }

    /// Pairwise IoU over the frame's identified detections. Needs no track
    /// history, so it also covers brand-new tracks.
    fn check_overlaps(&mut self, detections: &[Detection]) {
        for i in 0..detections.len() {
            for j in i + 1..detections.len() {
                let (a, b) = match (detections[i].track_id, detections[j].track_id) {
                    (Some(a), Some(b)) => (a, b),
                    _ => continue,
                };

                let iou = detections[i].bbox.iou(&detections[j].bbox);
                if iou > self.config.overlap_threshold {
                    let severity = if iou > self.config.severe_overlap_threshold {
                        Severity::High
                    } else {
                        Severity::Medium
                    };
                    self.current.push(Incident::new(
                        IncidentKind::PotentialAccident {
                            track_a: a,
                            track_b: b,
                            overlap_ratio: iou,
                        },
                        severity,
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speed_estimator::SpeedConfig;
    use trajectory_store::{BBox, TrackSample, VehicleClass};

    fn active(ids: &[TrackId]) -> HashSet<TrackId> {
        ids.iter().copied().collect()
    }

    fn still_sample(frame: usize) -> TrackSample {
        TrackSample::new(BBox::new(100.0, 100.0, 140.0, 130.0), frame as f64 / 30.0)
    }

    fn detection(id: TrackId, bbox: BBox) -> Detection {
        Detection::new(id, VehicleClass::Car, bbox, 0.9)
    }

    /// Drives store + estimator + detector together for `frames` frames of
    /// a single motionless track.
    fn run_stationary(frames: usize) -> (IncidentDetector, usize) {
        let mut store = TrajectoryStore::with_default_capacity();
        let mut speeds = SpeedEstimator::new(SpeedConfig::default());
        let mut detector = IncidentDetector::new(IncidentConfig::default());
        let ids = active(&[1]);

        let mut reported_frames = 0;
        for frame in 0..frames {
            store.record(1, still_sample(frame));
            speeds.update(&store, &ids);
            detector.update(&[], &store, &speeds, &ids);
            if !detector.incidents().is_empty() {
                reported_frames += 1;
            }
        }
        (detector, reported_frames)
    }

    #[test]
    fn test_stall_reported_only_past_threshold() {
        // Speed records start at 3 samples, so the counter starts on frame
        // index 2 and crosses 30 ticks on frame index 32.
        let (detector, reported) = run_stationary(33);
        assert_eq!(reported, 1);

        let incident = detector.incidents()[0];
        assert_eq!(incident.severity, Severity::High);
        match incident.kind {
            IncidentKind::StalledVehicle {
                track_id,
                duration_frames,
                ..
            } => {
                assert_eq!(track_id, 1);
                assert_eq!(duration_frames, 31);
            }
            other => panic!("unexpected incident {other:?}"),
        }
    }

    #[test]
    fn test_stall_not_reported_before_threshold() {
        let (_, reported) = run_stationary(32);
        assert_eq!(reported, 0);
    }

    #[test]
    fn test_stall_counter_resets_on_movement() {
        let mut store = TrajectoryStore::with_default_capacity();
        let mut speeds = SpeedEstimator::new(SpeedConfig::default());
        let mut detector = IncidentDetector::new(IncidentConfig::default());
        let ids = active(&[1]);

        // 20 stopped frames, then brisk movement, then stopped again at the
        // new spot. The counter must restart, so no stall fires within the
        // second bout. (The deceleration edge may briefly read as erratic;
        // only stall incidents matter here.)
        for frame in 0..20 {
            store.record(1, still_sample(frame));
            speeds.update(&store, &ids);
            detector.update(&[], &store, &speeds, &ids);
        }
        for frame in 20..40 {
            let x = 100.0 + (frame - 19) as f32 * 20.0;
            store.record(
                1,
                TrackSample::new(BBox::new(x, 100.0, x + 40.0, 130.0), frame as f64 / 30.0),
            );
            speeds.update(&store, &ids);
            detector.update(&[], &store, &speeds, &ids);
        }
        for frame in 40..65 {
            store.record(
                1,
                TrackSample::new(BBox::new(500.0, 100.0, 540.0, 130.0), frame as f64 / 30.0),
            );
            speeds.update(&store, &ids);
            detector.update(&[], &store, &speeds, &ids);
            let stalled = detector
                .incidents()
                .iter()
                .any(|i| matches!(i.kind, IncidentKind::StalledVehicle { .. }));
            assert!(!stalled, "stall fired too early at frame {frame}");
        }
    }

    #[test]
    fn test_erratic_driving_flags_jittery_track() {
        let mut store = TrajectoryStore::with_default_capacity();
        let speeds = SpeedEstimator::new(SpeedConfig::default());
        let mut detector = IncidentDetector::new(IncidentConfig::default());

        // Alternating long and short steps give step variance far above 50.
        let xs = [0.0, 40.0, 42.0, 80.0, 83.0, 120.0, 122.0, 160.0, 163.0, 200.0];
        for (frame, &x) in xs.iter().enumerate() {
            store.record(
                2,
                TrackSample::new(BBox::new(x, 50.0, x + 40.0, 80.0), frame as f64 / 30.0),
            );
        }

        detector.update(&[], &store, &speeds, &active(&[2]));

        let erratic: Vec<_> = detector
            .incidents()
            .iter()
            .filter(|i| matches!(i.kind, IncidentKind::ErraticDriving { .. }))
            .collect();
        assert_eq!(erratic.len(), 1);
        assert_eq!(erratic[0].severity, Severity::Medium);
        match erratic[0].kind {
            IncidentKind::ErraticDriving { variance, .. } => assert!(variance > 50.0),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_erratic_needs_full_window() {
        let mut store = TrajectoryStore::with_default_capacity();
        let speeds = SpeedEstimator::new(SpeedConfig::default());
        let mut detector = IncidentDetector::new(IncidentConfig::default());

        // Nine jittery samples: one short of the window, must stay quiet.
        let xs = [0.0, 40.0, 42.0, 80.0, 83.0, 120.0, 122.0, 160.0, 163.0];
        for (frame, &x) in xs.iter().enumerate() {
            store.record(
                2,
                TrackSample::new(BBox::new(x, 50.0, x + 40.0, 80.0), frame as f64 / 30.0),
            );
        }

        detector.update(&[], &store, &speeds, &active(&[2]));
        assert!(detector.incidents().is_empty());
    }

    #[test]
    fn test_full_overlap_is_high_severity_accident() {
        let store = TrajectoryStore::with_default_capacity();
        let speeds = SpeedEstimator::new(SpeedConfig::default());
        let mut detector = IncidentDetector::new(IncidentConfig::default());

        // 100x60 boxes offset 25 px along x: intersection 75x60 = 4500,
        // union 12000 - 4500 = 7500, IoU exactly 0.6.
        let a = detection(1, BBox::new(0.0, 0.0, 100.0, 60.0));
        let b = detection(2, BBox::new(25.0, 0.0, 125.0, 60.0));

        detector.update(&[a, b], &store, &speeds, &active(&[1, 2]));

        let incidents = detector.incidents();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].severity, Severity::High);
        match incidents[0].kind {
            IncidentKind::PotentialAccident {
                track_a,
                track_b,
                overlap_ratio,
            } => {
                assert_eq!((track_a, track_b), (1, 2));
                assert!((overlap_ratio - 0.6).abs() < 1e-4);
            }
            other => panic!("unexpected incident {other:?}"),
        }
    }

    #[test]
    fn test_moderate_overlap_is_medium_severity() {
        let store = TrajectoryStore::with_default_capacity();
        let speeds = SpeedEstimator::new(SpeedConfig::default());
        let mut detector = IncidentDetector::new(IncidentConfig::default());

        // Offset 60 of 100: intersection 40x60 = 2400, union 9600, IoU 0.25
        // stays quiet; offset 40: intersection 60x60 = 3600, union 8400,
        // IoU ~0.43 reports at medium.
        let a = detection(1, BBox::new(0.0, 0.0, 100.0, 60.0));
        let far = detection(2, BBox::new(60.0, 0.0, 160.0, 60.0));
        detector.update(&[a, far], &store, &speeds, &active(&[1, 2]));
        assert!(detector.incidents().is_empty());

        let near = detection(2, BBox::new(40.0, 0.0, 140.0, 60.0));
        detector.update(&[a, near], &store, &speeds, &active(&[1, 2]));
        assert_eq!(detector.incidents().len(), 1);
        assert_eq!(detector.incidents()[0].severity, Severity::Medium);
    }

    #[test]
    fn test_unidentified_detections_are_skipped() {
        let store = TrajectoryStore::with_default_capacity();
        let speeds = SpeedEstimator::new(SpeedConfig::default());
        let mut detector = IncidentDetector::new(IncidentConfig::default());

        let bbox = BBox::new(0.0, 0.0, 100.0, 60.0);
        let a = detection(1, bbox);
        let ghost = Detection::unconfirmed(VehicleClass::Car, bbox, 0.4);

        detector.update(&[a, ghost], &store, &speeds, &active(&[1]));
        assert!(detector.incidents().is_empty());
    }

    #[test]
    fn test_history_capped_at_limit() {
        let store = TrajectoryStore::with_default_capacity();
        let speeds = SpeedEstimator::new(SpeedConfig::default());
        let mut config = IncidentConfig::default();
        config.history_cap = 10;
        let mut detector = IncidentDetector::new(config);

        let a = detection(1, BBox::new(0.0, 0.0, 100.0, 60.0));
        let b = detection(2, BBox::new(10.0, 0.0, 110.0, 60.0));
        for _ in 0..25 {
            detector.update(&[a, b], &store, &speeds, &active(&[1, 2]));
        }
        assert_eq!(detector.history().count(), 10);
    }

    #[test]
    fn test_vanished_track_counter_purged() {
        let mut store = TrajectoryStore::with_default_capacity();
        let mut speeds = SpeedEstimator::new(SpeedConfig::default());
        let mut detector = IncidentDetector::new(IncidentConfig::default());

        // Build up a 20-frame stall, then the track vanishes for a frame
        // and returns. The counter must restart from zero.
        let ids = active(&[1]);
        for frame in 0..20 {
            store.record(1, still_sample(frame));
            speeds.update(&store, &ids);
            detector.update(&[], &store, &speeds, &ids);
        }

        let none = active(&[]);
        store.evict_missing(&none);
        speeds.update(&store, &none);
        detector.update(&[], &store, &speeds, &none);
        assert!(detector.stall_counters.is_empty());

        for frame in 21..46 {
            store.record(1, still_sample(frame));
            speeds.update(&store, &ids);
            detector.update(&[], &store, &speeds, &ids);
            assert!(detector.incidents().is_empty());
        }
    }
}
