//! Per-track speed record computation

use crate::stats::{step_displacements, DisplacementStats};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};
use trajectory_store::{TrackId, TrajectoryStore};

/// Speed estimator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedConfig {
    /// Source frame rate, used for the real-unit conversion.
    pub frame_rate: f64,

    /// Initial calibration factor: pixels per real-world unit (e.g. meter).
    /// Without an externally supplied calibration, real-unit speeds are a
    /// pixel-displacement proxy, not physical speed.
    pub pixels_per_unit: f64,

    /// Number of recent samples the speed window looks at.
    pub window: usize,

    /// Minimum history length before a record is produced.
    pub min_samples: usize,

    /// Guard added to the denominator of the stability ratio.
    pub epsilon: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            pixels_per_unit: 50.0,
            window: 10,
            min_samples: 3,
            epsilon: 0.1,
        }
    }
}

/// Derived kinematics for one track. Recomputed every frame the track has
/// enough history; absent otherwise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpeedRecord {
    /// Mean per-step displacement (pixels per frame).
    pub speed_per_frame: f64,

    /// Speed in calibrated real units per second.
    pub speed_real_units: f64,

    /// Heading of the window's net displacement, in radians
    /// (`atan2` convention; 0 when the track has not moved).
    pub direction_radians: f64,

    /// 1.0 for perfectly constant speed, falling toward 0 as step lengths
    /// spread out. Always in [0, 1].
    pub stability: f64,

    /// Number of samples the record was computed from.
    pub sample_count: usize,
}

/// Histogram over current real-unit speeds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeedHistogram {
    /// Bin edges, `bins + 1` entries spanning `[0, max + 1)`.
    pub bin_edges: Vec<f64>,
    pub counts: Vec<usize>,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

/// Speed & direction estimator over the shared trajectory store.
pub struct SpeedEstimator {
    config: SpeedConfig,
    /// Live calibration factor; starts from the config and may be replaced
    /// by [`SpeedEstimator::calibrate`].
    pixels_per_unit: f64,
    speeds: HashMap<TrackId, SpeedRecord>,
}

impl SpeedEstimator {
    pub fn new(config: SpeedConfig) -> Self {
        let pixels_per_unit = config.pixels_per_unit;
        Self {
            config,
            pixels_per_unit,
            speeds: HashMap::new(),
        }
    }

    /// Recompute records for every active track and drop records of tracks
    /// that vanished this frame.
    pub fn update(&mut self, store: &TrajectoryStore, active: &HashSet<TrackId>) {
        self.speeds.retain(|id, _| active.contains(id));

        for &id in active {
            let samples = store.history(id, self.config.window);
            if samples.len() < self.config.min_samples {
                self.speeds.remove(&id);
                continue;
            }

            let displacements = step_displacements(&samples);
            let stats = DisplacementStats::compute(&displacements);

            let speed_per_frame = stats.mean;
            let speed_real_units =
                speed_per_frame / self.pixels_per_unit * self.config.frame_rate;

            let first = samples[0].center;
            let last = samples[samples.len() - 1].center;
            let dx = (last.x - first.x) as f64;
            let dy = (last.y - first.y) as f64;
            let direction_radians = if dx == 0.0 && dy == 0.0 {
                0.0
            } else {
                dy.atan2(dx)
            };

            let stability =
                1.0 - (stats.std_dev / (speed_per_frame + self.config.epsilon)).min(1.0);

            self.speeds.insert(
                id,
                SpeedRecord {
                    speed_per_frame,
                    speed_real_units,
                    direction_radians,
                    stability,
                    sample_count: samples.len(),
                },
            );
        }
    }

    /// Speed record for one track, if it has enough history.
    pub fn speed(&self, id: TrackId) -> Option<&SpeedRecord> {
        self.speeds.get(&id)
    }

    /// All current records.
    pub fn speeds(&self) -> &HashMap<TrackId, SpeedRecord> {
        &self.speeds
    }

    /// Mean real-unit speed over every tracked vehicle; 0 when none qualify.
    pub fn average_speed(&self) -> f64 {
        if self.speeds.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.speeds.values().map(|r| r.speed_real_units).sum();
        sum / self.speeds.len() as f64
    }

    /// Distribution of current real-unit speeds across `bins` equal bins
    /// spanning `[0, max + 1)`.
    pub fn histogram(&self, bins: usize) -> SpeedHistogram {
        if self.speeds.is_empty() || bins == 0 {
            return SpeedHistogram::default();
        }

        let speeds: Vec<f64> = self.speeds.values().map(|r| r.speed_real_units).collect();
        let n = speeds.len() as f64;
        let mean = speeds.iter().sum::<f64>() / n;
        let min = speeds.iter().cloned().fold(f64::MAX, f64::min);
        let max = speeds.iter().cloned().fold(f64::MIN, f64::max);
        let variance = speeds.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n;

        let upper = max + 1.0;
        let width = upper / bins as f64;
        let bin_edges: Vec<f64> = (0..=bins).map(|i| i as f64 * width).collect();
        let mut counts = vec![0usize; bins];
        for &s in &speeds {
            let idx = ((s / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        SpeedHistogram {
            bin_edges,
            counts,
            mean,
            min,
            max,
            std_dev: variance.sqrt(),
        }
    }

    /// Update the pixels-per-unit calibration from a known distance.
    ///
    /// A non-positive pixel distance is a no-op: the previous factor stays in
    /// effect. Rewriting the factor only rescales future real-unit speeds.
    pub fn calibrate(&mut self, known_pixels: f64, known_real_units: f64) {
        if known_pixels <= 0.0 || known_real_units <= 0.0 {
            warn!(known_pixels, known_real_units, "ignoring degenerate calibration");
            return;
        }
        self.pixels_per_unit = known_pixels / known_real_units;
        info!(pixels_per_unit = self.pixels_per_unit, "speed calibration updated");
    }

    pub fn pixels_per_unit(&self) -> f64 {
        self.pixels_per_unit
    }
}
