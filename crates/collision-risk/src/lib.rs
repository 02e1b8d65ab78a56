//! Collision Risk Scorer
//!
//! Scores every unordered pair of active tracks for closing risk: a blend of
//! proximity (distance versus the pair's combined footprint) and approach
//! (closing velocity projected onto the separation line). Alerts are rebuilt
//! from scratch each frame; nothing persists across frames but the list
//! itself.

mod scorer;

pub use scorer::{CollisionAlert, CollisionConfig, CollisionScorer};
