//! Per-frame orchestration.
//!
//! One `process_frame` call runs every component in its required order:
//! record + evict trajectories, speeds, collision pairs, incidents, density,
//! aggregates, then the congestion forecaster. The pipeline owns all
//! component state; callers interact with one mutable value per camera.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use collision_risk::{CollisionAlert, CollisionScorer};
use density_grid::DensityGrid;
use flow_predictor::{Anomaly, CongestionForecast, FlowPredictor};
use incident_detector::{Incident, IncidentDetector};
use speed_estimator::SpeedEstimator;
use traffic_analytics::{AnalyticsSnapshot, SignalAdvisory, TrafficAnalytics};
use trajectory_store::{Detection, TrackId, TrackSample, TrajectoryStore};

use crate::config::{PipelineConfig, PipelineError};

/// Everything derived from one frame of detections.
#[derive(Debug, Clone, Serialize)]
pub struct FrameAnalysis {
    pub frame_time: f64,
    /// Active tracks over congestion capacity, clamped to [0, 1].
    pub congestion_level: f64,
    pub snapshot: AnalyticsSnapshot,
    pub collision_alerts: Vec<CollisionAlert>,
    pub incidents: Vec<Incident>,
    pub advisory: SignalAdvisory,
    pub congestion: Option<CongestionForecast>,
    pub anomalies: Vec<Anomaly>,
}

/// Owns every analytics component for one camera feed.
pub struct TrafficPipeline {
    config: PipelineConfig,
    store: TrajectoryStore,
    speeds: SpeedEstimator,
    collisions: CollisionScorer,
    incidents: IncidentDetector,
    density: DensityGrid,
    predictor: FlowPredictor,
    analytics: TrafficAnalytics,
}

impl TrafficPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let density = DensityGrid::new(config.grid.clone())?;
        info!(
            track_capacity = config.track_capacity,
            congestion_capacity = config.congestion_capacity,
            "pipeline ready"
        );
        Ok(Self {
            store: TrajectoryStore::new(config.track_capacity),
            speeds: SpeedEstimator::new(config.speed.clone()),
            collisions: CollisionScorer::new(config.collision.clone()),
            incidents: IncidentDetector::new(config.incidents.clone()),
            density,
            predictor: FlowPredictor::new(config.predictor.clone()),
            analytics: TrafficAnalytics::new(config.analytics.clone()),
            config,
        })
    }

    /// Runs all components against one frame of tracked detections.
    ///
    /// Unconfirmed detections (no track id) are dropped up front; every
    /// component operates on the identified set only. Per-track state for
    /// ids absent from this frame is gone by the time this returns.
    pub fn process_frame(&mut self, frame_time: f64, detections: &[Detection]) -> FrameAnalysis {
        let identified: Vec<Detection> = detections
            .iter()
            .filter(|d| d.track_id.is_some())
            .copied()
            .collect();
        let active: HashSet<TrackId> = identified.iter().filter_map(|d| d.track_id).collect();

        for detection in &identified {
            if let Some(id) = detection.track_id {
                self.store
                    .record(id, TrackSample::new(detection.bbox, frame_time));
            }
        }
        self.store.evict_missing(&active);

        self.speeds.update(&self.store, &active);
        self.collisions.update(&self.store, &active);
        self.incidents
            .update(&identified, &self.store, &self.speeds, &active);
        self.density.update(&identified);
        self.analytics.update(&identified, &self.store, &active);

        let congestion_level =
            (active.len() as f64 / self.config.congestion_capacity as f64).min(1.0);
        self.predictor.update(
            active.len(),
            self.speeds.average_speed(),
            congestion_level,
            frame_time,
        );

        debug!(
            frame_time,
            active = active.len(),
            alerts = self.collisions.alerts().len(),
            incidents = self.incidents.incidents().len(),
            "frame processed"
        );

        FrameAnalysis {
            frame_time,
            congestion_level,
            snapshot: self.analytics.snapshot(),
            collision_alerts: self.collisions.alerts().to_vec(),
            incidents: self.incidents.incidents().to_vec(),
            advisory: self.analytics.advisory(),
            congestion: self.predictor.congestion_forecast(),
            anomalies: self.predictor.anomalies(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &TrajectoryStore {
        &self.store
    }

    pub fn speeds(&self) -> &SpeedEstimator {
        &self.speeds
    }

    pub fn density(&self) -> &DensityGrid {
        &self.density
    }

    pub fn predictor(&self) -> &FlowPredictor {
        &self.predictor
    }

    pub fn incident_detector(&self) -> &IncidentDetector {
        &self.incidents
    }

    pub fn analytics(&self) -> &TrafficAnalytics {
        &self.analytics
    }
}
