//! Single owner of every track's trajectory

use crate::history::{TrackHistory, TrackSample};
use crate::TrackId;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Default history capacity; covers the longest consumer window.
pub const DEFAULT_CAPACITY: usize = 120;

/// Shared trajectory store.
///
/// Components never keep their own position history. They slice this store
/// with whatever window they need, so retention and eviction semantics are
/// identical everywhere. `record` and `evict_missing` run once per frame,
/// before any consumer reads.
#[derive(Debug)]
pub struct TrajectoryStore {
    tracks: HashMap<TrackId, TrackHistory>,
    capacity: usize,
}

impl TrajectoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            tracks: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Append a sample to the track's history, creating it on first sight.
    pub fn record(&mut self, id: TrackId, sample: TrackSample) {
        self.tracks
            .entry(id)
            .or_insert_with(|| TrackHistory::new(self.capacity))
            .push(sample);
    }

    /// Drop every track absent from `active`.
    pub fn evict_missing(&mut self, active: &HashSet<TrackId>) {
        let before = self.tracks.len();
        self.tracks.retain(|id, _| active.contains(id));
        let evicted = before - self.tracks.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.tracks.len(), "evicted vanished tracks");
        }
    }

    /// The most recent `window` samples for a track, oldest first.
    ///
    /// Unknown ids degrade to an empty sequence, never an error.
    pub fn history(&self, id: TrackId, window: usize) -> Vec<TrackSample> {
        self.tracks
            .get(&id)
            .map(|h| h.last_n(window))
            .unwrap_or_default()
    }

    /// Full bounded history for a track.
    pub fn track(&self, id: TrackId) -> Option<&TrackHistory> {
        self.tracks.get(&id)
    }

    /// Newest sample for a track.
    pub fn latest(&self, id: TrackId) -> Option<&TrackSample> {
        self.tracks.get(&id).and_then(|h| h.latest())
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id)
    }

    /// Number of tracks currently stored.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track_ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.keys().copied()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

impl Default for TrajectoryStore {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
