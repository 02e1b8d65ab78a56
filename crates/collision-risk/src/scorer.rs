//! Pairwise risk computation

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;
use trajectory_store::{Point, TrackId, TrackSample, TrajectoryStore};

/// Collision scorer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionConfig {
    /// Clearance added to the two box diagonals when deriving the minimum
    /// safe distance (pixels).
    pub safety_margin: f64,

    /// Samples used for the per-track velocity estimate.
    pub velocity_window: usize,

    /// Minimum history length before a track participates in scoring.
    pub min_samples: usize,

    /// Fallback timestep when a velocity window spans zero elapsed time
    /// (seconds).
    pub default_timestep: f64,

    /// Weight of the proximity term.
    pub distance_weight: f64,

    /// Weight of the closing-velocity term.
    pub approach_weight: f64,

    /// Speed magnitude below which a track counts as stationary.
    pub stationary_epsilon: f64,

    /// Guard added to distance/speed denominators.
    pub epsilon: f64,

    /// Minimum score for a pair to be reported.
    pub risk_threshold: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            safety_margin: 50.0,
            velocity_window: 5,
            min_samples: 3,
            default_timestep: 0.033,
            distance_weight: 0.6,
            approach_weight: 0.4,
            stationary_epsilon: 0.1,
            epsilon: 0.1,
            risk_threshold: 0.6,
        }
    }
}

/// One scored pair above the reporting threshold.
///
/// The pair is unordered; `track_a < track_b` by construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollisionAlert {
    pub track_a: TrackId,
    pub track_b: TrackId,
    /// Blended risk, always in [0, 1].
    pub risk_score: f64,
    /// Current center-to-center distance in pixels.
    pub distance: f64,
    pub position_a: Point,
    pub position_b: Point,
}

/// Scores all active pairs once per frame.
///
/// O(n²) in active track count, which frame occupancy keeps small; a
/// bucketed spatial index would be the next step if that assumption breaks.
pub struct CollisionScorer {
    config: CollisionConfig,
    alerts: Vec<CollisionAlert>,
}

impl CollisionScorer {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            alerts: Vec::new(),
        }
    }

    /// Rebuild the alert list from the current frame's active tracks.
    pub fn update(&mut self, store: &TrajectoryStore, active: &HashSet<TrackId>) {
        self.alerts.clear();

        let mut ids: Vec<TrackId> = active
            .iter()
            .copied()
            .filter(|&id| {
                store
                    .track(id)
                    .map_or(false, |h| h.len() >= self.config.min_samples)
            })
            .collect();
        ids.sort_unstable();

        for i in 0..ids.len() {
            for &b in &ids[i + 1..] {
                let a = ids[i];
                if let Some(alert) = self.score_pair(store, a, b) {
                    if alert.risk_score > self.config.risk_threshold {
                        self.alerts.push(alert);
                    }
                }
            }
        }

        self.alerts.sort_by(|x, y| {
            y.risk_score
                .partial_cmp(&x.risk_score)
                .unwrap_or(Ordering::Equal)
        });

        if !self.alerts.is_empty() {
            debug!(
                alerts = self.alerts.len(),
                top_risk = self.alerts[0].risk_score,
                "collision risk above threshold"
            );
        }
    }

    /// Current alerts, sorted by descending risk.
    pub fn alerts(&self) -> &[CollisionAlert] {
        &self.alerts
    }

    fn score_pair(
        &self,
        store: &TrajectoryStore,
        a: TrackId,
        b: TrackId,
    ) -> Option<CollisionAlert> {
        let window_a = store.history(a, self.config.velocity_window);
        let window_b = store.history(b, self.config.velocity_window);
        let latest_a = window_a.last()?;
        let latest_b = window_b.last()?;

        let velocity_a = self.estimate_velocity(&window_a);
        let velocity_b = self.estimate_velocity(&window_b);

        let (risk_score, distance) =
            self.risk(latest_a, velocity_a, latest_b, velocity_b);

        Some(CollisionAlert {
            track_a: a,
            track_b: b,
            risk_score,
            distance,
            position_a: latest_a.center,
            position_b: latest_b.center,
        })
    }

    /// Net displacement over the window divided by elapsed time; falls back
    /// to the default timestep when the window spans no time at all.
    fn estimate_velocity(&self, samples: &[TrackSample]) -> (f64, f64) {
        if samples.len() < 2 {
            return (0.0, 0.0);
        }
        let first = &samples[0];
        let last = &samples[samples.len() - 1];

        let mut dt = last.timestamp - first.timestamp;
        if dt <= 0.0 {
            dt = self.config.default_timestep;
        }

        (
            (last.center.x - first.center.x) as f64 / dt,
            (last.center.y - first.center.y) as f64 / dt,
        )
    }

    fn risk(
        &self,
        sample_a: &TrackSample,
        velocity_a: (f64, f64),
        sample_b: &TrackSample,
        velocity_b: (f64, f64),
    ) -> (f64, f64) {
        let dx = (sample_b.center.x - sample_a.center.x) as f64;
        let dy = (sample_b.center.y - sample_a.center.y) as f64;
        let distance = (dx * dx + dy * dy).sqrt();

        let min_safe = sample_a.bbox.diagonal() as f64
            + sample_b.bbox.diagonal() as f64
            + self.config.safety_margin;

        let mag_a = (velocity_a.0 * velocity_a.0 + velocity_a.1 * velocity_a.1).sqrt();
        let mag_b = (velocity_b.0 * velocity_b.0 + velocity_b.1 * velocity_b.1).sqrt();

        // Two parked vehicles are not a collision, however close they sit.
        if mag_a < self.config.stationary_epsilon && mag_b < self.config.stationary_epsilon {
            return (0.0, distance);
        }

        // Gap closing rate: positive when the pair is converging. Relative
        // velocity projected onto the separation line, sign flipped so that
        // shrinking distance reads positive.
        let rel_x = velocity_b.0 - velocity_a.0;
        let rel_y = velocity_b.1 - velocity_a.1;
        let closing_rate = -(rel_x * dx + rel_y * dy) / (distance + self.config.epsilon);

        let distance_risk = if distance < min_safe {
            1.0 - (distance / min_safe).min(1.0)
        } else {
            0.0
        };
        let approach_risk = closing_rate.max(0.0) / (mag_a + mag_b + self.config.epsilon);

        let score = self.config.distance_weight * distance_risk
            + self.config.approach_weight * approach_risk;

        (score.clamp(0.0, 1.0), distance)
    }
}
