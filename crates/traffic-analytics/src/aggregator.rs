use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use speed_estimator::stats::erratic_variance;
use tracing::debug;
use trajectory_store::{Detection, TrackId, TrajectoryStore};

use crate::emissions::{ClassCounts, EmissionFactors};
use crate::violation::{Violation, ViolationKind};

/// Tunables for the aggregation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Frame height in pixels, used to place the stop line.
    pub frame_height: u32,
    /// Stop line as a fraction of frame height, measured from the top.
    pub stop_line_fraction: f32,
    /// Violation log entries kept before the oldest is dropped.
    pub violation_log_cap: usize,
    /// Logged violations counted as "recent" by the risk index.
    pub recent_violation_window: usize,
    /// Risk weight per active track.
    pub active_weight: f64,
    /// Risk weight per recent stop-line violation.
    pub violation_weight: f64,
    /// Risk weight per erratic track.
    pub erratic_weight: f64,
    /// Samples per track inspected for erratic motion.
    pub erratic_window: usize,
    /// Displacement variance above which a track counts as erratic.
    pub erratic_variance_threshold: f64,
    /// Frames of active-count history behind the signal advisory.
    pub advisory_window: usize,
    pub emission_factors: EmissionFactors,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            frame_height: 720,
            stop_line_fraction: 0.7,
            violation_log_cap: 50,
            recent_violation_window: 30,
            active_weight: 5.0,
            violation_weight: 2.0,
            erratic_weight: 10.0,
            erratic_window: 10,
            erratic_variance_threshold: 50.0,
            advisory_window: 30,
            emission_factors: EmissionFactors::default(),
        }
    }
}

/// Recommended adjustment to the green phase at the monitored approach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAdvisory {
    ExtendSubstantially,
    ExtendModerately,
    Maintain,
    Reduce,
}

impl SignalAdvisory {
    pub fn message(&self) -> &'static str {
        match self {
            SignalAdvisory::ExtendSubstantially => "Extend green phase substantially",
            SignalAdvisory::ExtendModerately => "Extend green phase moderately",
            SignalAdvisory::Maintain => "Maintain current signal timing",
            SignalAdvisory::Reduce => "Reduce green phase",
        }
    }
}

/// Point-in-time aggregate view, cheap to serialize for a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub class_counts: ClassCounts,
    pub active_tracks: usize,
    pub peak_active: usize,
    pub violations: Vec<Violation>,
    pub risk_index: f64,
    pub emissions_g_per_s: f64,
}

/// Accumulates frame-over-frame traffic statistics.
///
/// Class counts, the peak-active watermark and the violation log only ever
/// grow; the first-seen and crossed sets are per-track state and are purged
/// as soon as a track id leaves the frame, so a reused id is treated as a
/// new vehicle.
pub struct TrafficAnalytics {
    config: AnalyticsConfig,
    class_counts: ClassCounts,
    counted: HashSet<TrackId>,
    crossed: HashSet<TrackId>,
    active: usize,
    peak_active: usize,
    violations: VecDeque<Violation>,
    active_window: VecDeque<usize>,
    risk_index: f64,
}

impl TrafficAnalytics {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            config,
            class_counts: ClassCounts::default(),
            counted: HashSet::new(),
            crossed: HashSet::new(),
            active: 0,
            peak_active: 0,
            violations: VecDeque::new(),
            active_window: VecDeque::new(),
            risk_index: 0.0,
        }
    }

    /// Folds one frame of detections into the running aggregates.
    ///
    /// The store must already hold this frame's samples so that stop-line
    /// checks can compare the latest position against the previous one.
    pub fn update(
        &mut self,
        detections: &[Detection],
        store: &TrajectoryStore,
        active: &HashSet<TrackId>,
    ) {
        self.active = active.len();
        self.peak_active = self.peak_active.max(self.active);

        self.active_window.push_back(self.active);
        if self.active_window.len() > self.config.advisory_window {
            self.active_window.pop_front();
        }

        for detection in detections {
            let id = match detection.track_id {
                Some(id) => id,
                None => continue,
            };
            if self.counted.insert(id) {
                self.class_counts.increment(detection.class);
            }
            self.check_stop_line(id, detection, store);
        }

        self.risk_index = self.compute_risk(store, active);

        self.counted.retain(|id| active.contains(id));
        self.crossed.retain(|id| active.contains(id));
    }

    fn check_stop_line(&mut self, id: TrackId, detection: &Detection, store: &TrajectoryStore) {
        let line_y = self.config.stop_line_fraction * self.config.frame_height as f32;
        let recent = store.history(id, 2);
        if recent.len() < 2 {
            return;
        }
        let previous = recent[0].center.y;
        let current = recent[1].center.y;
        if !(previous < line_y && current >= line_y) {
            return;
        }
        if !self.crossed.insert(id) {
            return;
        }
        let kind = ViolationKind::CrossingStopLine;
        if let Some(last) = self.violations.back() {
            if last.track_id == id && last.kind == kind {
                return;
            }
        }
        if self.violations.len() == self.config.violation_log_cap {
            self.violations.pop_front();
        }
        debug!(track_id = id, kind = kind.label(), "violation logged");
        self.violations
            .push_back(Violation::new(id, kind, detection.class));
    }

    fn compute_risk(&self, store: &TrajectoryStore, active: &HashSet<TrackId>) -> f64 {
        let erratic = active
            .iter()
            .filter(|id| {
                let samples = store.history(**id, self.config.erratic_window);
                match erratic_variance(&samples, self.config.erratic_window) {
                    Some(variance) => variance > self.config.erratic_variance_threshold,
                    None => false,
                }
            })
            .count();
        let recent_violations = self
            .violations
            .iter()
            .rev()
            .take(self.config.recent_violation_window)
            .filter(|violation| violation.kind == ViolationKind::CrossingStopLine)
            .count();

        let raw = self.active as f64 * self.config.active_weight
            + recent_violations as f64 * self.config.violation_weight
            + erratic as f64 * self.config.erratic_weight;
        raw.clamp(0.0, 100.0)
    }

    /// Green-phase recommendation from the rolling active-count window.
    pub fn advisory(&self) -> SignalAdvisory {
        if self.active_window.is_empty() {
            return SignalAdvisory::Maintain;
        }
        let mean = self.active_window.iter().sum::<usize>() as f64
            / self.active_window.len() as f64;
        let current = self.active as f64;
        if current > 1.5 * mean && current > 15.0 {
            SignalAdvisory::ExtendSubstantially
        } else if current > 1.2 * mean && current > 8.0 {
            SignalAdvisory::ExtendModerately
        } else if current > 0.8 * mean {
            SignalAdvisory::Maintain
        } else {
            SignalAdvisory::Reduce
        }
    }

    pub fn risk_index(&self) -> f64 {
        self.risk_index
    }

    pub fn class_counts(&self) -> &ClassCounts {
        &self.class_counts
    }

    pub fn peak_active(&self) -> usize {
        self.peak_active
    }

    pub fn emission_estimate(&self) -> f64 {
        self.config.emission_factors.estimate(&self.class_counts)
    }

    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }

    pub fn snapshot(&self) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            class_counts: self.class_counts,
            active_tracks: self.active,
            peak_active: self.peak_active,
            violations: self.violations.iter().copied().collect(),
            risk_index: self.risk_index,
            emissions_g_per_s: self.emission_estimate(),
        }
    }
}
