//! Traffic Analytics Pipeline
//!
//! Composes the analytics components into a single per-frame engine and
//! provides the replay driver used for demos and end-to-end tests. The
//! pipeline itself is synchronous; the binary wraps it in a producer task
//! and a bounded frame queue.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod config;
mod pipeline;
pub mod scenario;

pub use config::{PipelineConfig, PipelineError};
pub use pipeline::{FrameAnalysis, TrafficPipeline};

/// Install the global log subscriber.
///
/// Logs go to stderr so the replay binary's stdout stays a clean stream of
/// JSON analysis lines.
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}
