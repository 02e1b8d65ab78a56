//! Bounded per-track sample history

use crate::geometry::{BBox, Point};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One recorded observation of a track. Immutable once stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    /// Box midpoint in frame pixels.
    pub center: Point,
    /// Full detection box.
    pub bbox: BBox,
    /// Frame timestamp in monotonic seconds.
    pub timestamp: f64,
}

impl TrackSample {
    pub fn new(bbox: BBox, timestamp: f64) -> Self {
        Self {
            center: bbox.center(),
            bbox,
            timestamp,
        }
    }
}

/// Capacity-bounded FIFO of samples for a single track.
///
/// The capacity covers the longest consumer window; shorter consumers slice
/// their suffix with [`TrackHistory::last_n`].
#[derive(Debug, Clone)]
pub struct TrackHistory {
    samples: VecDeque<TrackSample>,
    capacity: usize,
}

impl TrackHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, dropping the oldest when full.
    pub fn push(&mut self, sample: TrackSample) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest-to-newest iteration over the whole history.
    pub fn iter(&self) -> impl Iterator<Item = &TrackSample> {
        self.samples.iter()
    }

    /// The most recent `n` samples, oldest first.
    pub fn last_n(&self, n: usize) -> Vec<TrackSample> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).copied().collect()
    }

    /// The newest sample, if any.
    pub fn latest(&self) -> Option<&TrackSample> {
        self.samples.back()
    }
}
