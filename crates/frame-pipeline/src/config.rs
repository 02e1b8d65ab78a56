//! Master configuration for the pipeline.
//!
//! Every component keeps its own config struct; this module composes them
//! and layers overrides on top of the built-in defaults: an optional TOML
//! file first, then `TRAFFIC_`-prefixed environment variables (nested keys
//! separated by `__`, e.g. `TRAFFIC_SPEED__WINDOW=20`).

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use collision_risk::CollisionConfig;
use density_grid::{GridConfig, GridError};
use flow_predictor::PredictorConfig;
use incident_detector::IncidentConfig;
use speed_estimator::SpeedConfig;
use traffic_analytics::AnalyticsConfig;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Density grid rejected its configuration: {0}")]
    Grid(#[from] GridError),
    #[error("Congestion capacity must be positive")]
    ZeroCongestionCapacity,
}

/// Composite settings for a [`TrafficPipeline`](crate::TrafficPipeline).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Samples retained per track; covers the longest consumer window.
    pub track_capacity: usize,
    /// Active-track count treated as fully congested.
    pub congestion_capacity: usize,
    pub speed: SpeedConfig,
    pub collision: CollisionConfig,
    pub incidents: IncidentConfig,
    pub grid: GridConfig,
    pub predictor: PredictorConfig,
    pub analytics: AnalyticsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            track_capacity: trajectory_store::DEFAULT_CAPACITY,
            congestion_capacity: 20,
            speed: SpeedConfig::default(),
            collision: CollisionConfig::default(),
            incidents: IncidentConfig::default(),
            grid: GridConfig::default(),
            predictor: PredictorConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Builds the effective configuration: defaults, then the optional
    /// file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let defaults = Config::try_from(&PipelineConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("TRAFFIC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: PipelineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), PipelineError> {
        if self.congestion_capacity == 0 {
            return Err(PipelineError::ZeroCongestionCapacity);
        }
        Ok(())
    }
}
