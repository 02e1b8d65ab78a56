//! Time-series windows, forecasts and anomaly checks

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::info;

/// Flow predictor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Rolling window capacity in frames; forecasts start once full.
    pub history_length: usize,

    /// Frames projected ahead of the current one.
    pub horizon: usize,

    /// Trend damping per series. Higher alpha damps harder.
    pub count_alpha: f64,
    pub speed_alpha: f64,
    pub congestion_alpha: f64,

    /// Samples summarized into each forecast's mean and std dev.
    pub stats_window: usize,

    /// Newest samples examined by the anomaly checks.
    pub anomaly_window: usize,

    /// Count samples required before anomaly checks run at all.
    pub anomaly_min_samples: usize,

    /// |z| above which a count is unusual.
    pub z_threshold: f64,

    /// |z| above which the count anomaly is high severity.
    pub severe_z_threshold: f64,

    /// Absolute single-step speed change that counts as a jump.
    pub speed_jump_threshold: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            history_length: 60,
            horizon: 30,
            count_alpha: 0.3,
            speed_alpha: 0.2,
            congestion_alpha: 0.25,
            stats_window: 10,
            anomaly_window: 20,
            anomaly_min_samples: 5,
            z_threshold: 2.5,
            severe_z_threshold: 3.0,
            speed_jump_threshold: 5.0,
        }
    }
}

/// Forecast for one scalar series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesForecast {
    /// Newest observed value.
    pub current: f64,
    /// Mean over the stats window.
    pub mean: f64,
    /// Population std dev over the stats window.
    pub std_dev: f64,
    /// Last-step delta the projection extrapolates.
    pub trend: f64,
    /// Projected values for steps 1..=horizon, clamped non-negative.
    pub predictions: Vec<f64>,
}

/// Congestion outlook bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn status_line(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Light Traffic Ahead",
            RiskLevel::Medium => "Moderate Congestion Building",
            RiskLevel::High => "Heavy Congestion Expected",
        }
    }
}

/// Classified congestion forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CongestionForecast {
    pub status: String,
    pub risk_level: RiskLevel,
    pub current: f64,
    pub predicted_peak: f64,
    pub predictions: Vec<f64>,
    pub trend: f64,
}

/// Anomaly severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Medium,
    High,
}

/// Unusual traffic pattern found in the recent windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Anomaly {
    /// A recent count sits far outside the window's distribution.
    UnusualVehicleCount {
        z_score: f64,
        severity: AnomalySeverity,
    },

    /// Average speed moved more than the jump threshold in one step.
    SuddenSpeedChange {
        change: f64,
        severity: AnomalySeverity,
    },
}

/// Fixed-capacity scalar window, oldest evicted first.
struct Window {
    data: VecDeque<f64>,
    capacity: usize,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, value: f64) {
        if self.data.len() >= self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(value);
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    fn last(&self) -> Option<f64> {
        self.data.back().copied()
    }

    fn second_last(&self) -> Option<f64> {
        if self.data.len() < 2 {
            return None;
        }
        self.data.get(self.data.len() - 2).copied()
    }

    /// Newest `n` values, oldest first.
    fn last_n(&self, n: usize) -> Vec<f64> {
        self.data
            .iter()
            .skip(self.data.len().saturating_sub(n))
            .copied()
            .collect()
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Forecaster over the aggregator's per-frame scalars.
pub struct FlowPredictor {
    config: PredictorConfig,
    counts: Window,
    speeds: Window,
    congestion: Window,
    timestamps: Window,
    count_series: Option<SeriesForecast>,
    speed_series: Option<SeriesForecast>,
    congestion_series: Option<SeriesForecast>,
}

impl FlowPredictor {
    pub fn new(config: PredictorConfig) -> Self {
        let capacity = config.history_length;
        Self {
            config,
            counts: Window::new(capacity),
            speeds: Window::new(capacity),
            congestion: Window::new(capacity),
            timestamps: Window::new(capacity),
            count_series: None,
            speed_series: None,
            congestion_series: None,
        }
    }

    /// Fold one frame's scalars in; refresh forecasts once the window is
    /// full.
    pub fn update(
        &mut self,
        vehicle_count: usize,
        average_speed: f64,
        congestion_level: f64,
        timestamp: f64,
    ) {
        self.counts.push(vehicle_count as f64);
        self.speeds.push(average_speed);
        self.congestion.push(congestion_level);
        self.timestamps.push(timestamp);

        if self.counts.is_full() {
            let warming_up = self.count_series.is_none();
            self.count_series = self.forecast_series(&self.counts, self.config.count_alpha);
            self.speed_series = self.forecast_series(&self.speeds, self.config.speed_alpha);
            self.congestion_series =
                self.forecast_series(&self.congestion, self.config.congestion_alpha);
            if warming_up {
                info!(frames = self.counts.len(), "forecast window filled");
            }
        }
    }

    /// Whether the windows have filled and forecasts exist.
    pub fn ready(&self) -> bool {
        self.count_series.is_some()
    }

    pub fn latest_timestamp(&self) -> Option<f64> {
        self.timestamps.last()
    }

    pub fn vehicle_count_forecast(&self) -> Option<&SeriesForecast> {
        self.count_series.as_ref()
    }

    pub fn average_speed_forecast(&self) -> Option<&SeriesForecast> {
        self.speed_series.as_ref()
    }

    /// Congestion projection classified by the mean of its predictions:
    /// above 0.7 is High, 0.4 up to and including 0.7 is Medium, anything
    /// lower is Low.
    pub fn congestion_forecast(&self) -> Option<CongestionForecast> {
        let series = self.congestion_series.as_ref()?;
        if series.predictions.is_empty() {
            return None;
        }

        let mean =
            series.predictions.iter().sum::<f64>() / series.predictions.len() as f64;
        let risk_level = if mean > 0.7 {
            RiskLevel::High
        } else if mean >= 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        let predicted_peak = series.predictions.iter().copied().fold(0.0f64, f64::max);

        Some(CongestionForecast {
            status: risk_level.status_line().to_string(),
            risk_level,
            current: series.current,
            predicted_peak,
            predictions: series.predictions.clone(),
            trend: series.trend,
        })
    }

    /// Scan the recent windows for unusual patterns. Both checks can
    /// report in the same evaluation.
    pub fn anomalies(&self) -> Vec<Anomaly> {
        let mut found = Vec::new();
        if self.counts.len() < self.config.anomaly_min_samples {
            return found;
        }

        let counts = self.counts.last_n(self.config.anomaly_window);
        let (mean, std) = mean_std(&counts);
        if std > 0.0 {
            let max_z = counts
                .iter()
                .map(|c| ((c - mean) / std).abs())
                .fold(0.0f64, f64::max);
            if max_z > self.config.z_threshold {
                let severity = if max_z > self.config.severe_z_threshold {
                    AnomalySeverity::High
                } else {
                    AnomalySeverity::Medium
                };
                found.push(Anomaly::UnusualVehicleCount {
                    z_score: max_z,
                    severity,
                });
            }
        }

        let speeds = self.speeds.last_n(self.config.anomaly_window);
        if speeds.len() > 2 {
            let max_jump = speeds
                .windows(2)
                .map(|pair| (pair[1] - pair[0]).abs())
                .fold(0.0f64, f64::max);
            if max_jump > self.config.speed_jump_threshold {
                found.push(Anomaly::SuddenSpeedChange {
                    change: max_jump,
                    severity: AnomalySeverity::Medium,
                });
            }
        }

        found
    }

    /// Level-plus-damped-trend projection: level is the newest value,
    /// trend the last step, and each horizon step extends the trend scaled
    /// by (1 - alpha). Higher alpha therefore projects more cautiously.
    fn forecast_series(&self, window: &Window, alpha: f64) -> Option<SeriesForecast> {
        let level = window.last()?;
        let prev = window.second_last()?;
        let trend = level - prev;
        let damped = trend * (1.0 - alpha);

        let predictions: Vec<f64> = (1..=self.config.horizon)
            .map(|h| (level + h as f64 * damped).max(0.0))
            .collect();

        let recent = window.last_n(self.config.stats_window);
        let (mean, std_dev) = mean_std(&recent);

        Some(SeriesForecast {
            current: level,
            mean,
            std_dev,
            trend,
            predictions,
        })
    }
}
