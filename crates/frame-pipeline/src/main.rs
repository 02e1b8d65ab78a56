//! Traffic Analytics Pipeline - Replay Entry Point

use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

use frame_pipeline::scenario::{scene, FRAME_INTERVAL, TOTAL_FRAMES};
use frame_pipeline::{init_logging, PipelineConfig, TrafficPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("=== Traffic Analytics Pipeline v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Replaying synthetic intersection scene...");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = PipelineConfig::load(config_path.as_deref())?;
    let mut pipeline = TrafficPipeline::new(config)?;

    let (tx, mut rx) = mpsc::channel(32);
    let producer = tokio::spawn(async move {
        for frame in 0..TOTAL_FRAMES {
            let frame_time = frame as f64 * FRAME_INTERVAL;
            if tx.send((frame_time, scene(frame))).await.is_err() {
                break;
            }
        }
    });

    while let Some((frame_time, detections)) = rx.recv().await {
        let analysis = pipeline.process_frame(frame_time, &detections);
        println!("{}", serde_json::to_string(&analysis)?);
    }
    producer.await?;

    let snapshot = pipeline.analytics().snapshot();
    info!(
        vehicles = snapshot.class_counts.total(),
        peak_active = snapshot.peak_active,
        violations = snapshot.violations.len(),
        hotspots = pipeline.density().hotspots(0.5).len(),
        risk_index = snapshot.risk_index,
        "replay complete"
    );
    if let Some(forecast) = pipeline.predictor().congestion_forecast() {
        info!(status = %forecast.status, trend = forecast.trend, "congestion outlook");
    }

    Ok(())
}
