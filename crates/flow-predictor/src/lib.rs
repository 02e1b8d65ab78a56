//! Flow Predictor
//!
//! Rolls per-frame traffic scalars (vehicle count, average speed,
//! congestion level) into fixed-length windows and projects each forward
//! with a level-plus-damped-trend model. Also watches the recent windows
//! for statistical anomalies: count outliers by z-score and single-step
//! speed jumps.
//!
//! Forecasts are deliberately absent until the windows first fill; a
//! half-empty window says more about warmup than about traffic.

mod predictor;

pub use predictor::{
    Anomaly, AnomalySeverity, CongestionForecast, FlowPredictor, PredictorConfig, RiskLevel,
    SeriesForecast,
};
