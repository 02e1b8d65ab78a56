//! Displacement statistics over trajectory windows

use trajectory_store::TrackSample;

/// Summary statistics for a sequence of per-step displacements.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplacementStats {
    /// Mean step length (pixels per frame).
    pub mean: f64,
    /// Population variance of step lengths.
    pub variance: f64,
    /// Population standard deviation of step lengths.
    pub std_dev: f64,
    /// Number of steps the statistics were computed from.
    pub steps: usize,
}

impl DisplacementStats {
    /// Compute statistics from a slice of step lengths.
    pub fn compute(displacements: &[f64]) -> Self {
        if displacements.is_empty() {
            return Self::default();
        }

        let n = displacements.len() as f64;
        let mean = displacements.iter().sum::<f64>() / n;

        let variance = displacements
            .iter()
            .map(|d| {
                let diff = d - mean;
                diff * diff
            })
            .sum::<f64>()
            / n;

        Self {
            mean,
            variance,
            std_dev: variance.sqrt(),
            steps: displacements.len(),
        }
    }
}

/// Consecutive center-to-center distances along a trajectory window.
pub fn step_displacements(samples: &[TrackSample]) -> Vec<f64> {
    samples
        .windows(2)
        .map(|pair| pair[0].center.distance(&pair[1].center) as f64)
        .collect()
}

/// Canonical erratic-motion signal: population variance of step lengths over
/// a full window of raw positions.
///
/// Returns `None` until the track has accumulated `window` samples, so the
/// check never fires on a thin trajectory.
pub fn erratic_variance(samples: &[TrackSample], window: usize) -> Option<f64> {
    if window < 2 || samples.len() < window {
        return None;
    }
    let displacements = step_displacements(samples);
    Some(DisplacementStats::compute(&displacements).variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajectory_store::BBox;

    fn track(xs: &[f32]) -> Vec<TrackSample> {
        xs.iter()
            .enumerate()
            .map(|(i, &x)| TrackSample::new(BBox::new(x, 0.0, x + 10.0, 10.0), i as f64))
            .collect()
    }

    #[test]
    fn test_uniform_motion_has_zero_variance() {
        let samples = track(&[0.0, 10.0, 20.0, 30.0]);
        let stats = DisplacementStats::compute(&step_displacements(&samples));
        assert!((stats.mean - 10.0).abs() < 1e-6);
        assert!(stats.variance < 1e-9);
        assert_eq!(stats.steps, 3);
    }

    #[test]
    fn test_variance_matches_population_formula() {
        // Steps are 2 and 6: mean 4, population variance 4.
        let stats = DisplacementStats::compute(&[2.0, 6.0]);
        assert!((stats.mean - 4.0).abs() < 1e-9);
        assert!((stats.variance - 4.0).abs() < 1e-9);
        assert!((stats.std_dev - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_displacements() {
        let stats = DisplacementStats::compute(&[]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.steps, 0);
    }

    #[test]
    fn test_erratic_variance_needs_full_window() {
        let samples = track(&[0.0, 8.0, 1.0, 9.0, 2.0]);
        assert!(erratic_variance(&samples, 10).is_none());
        assert!(erratic_variance(&samples, 5).is_some());
    }

    #[test]
    fn test_erratic_variance_flags_jitter() {
        // Alternating large jumps produce high step variance.
        let jittery = track(&[0.0, 30.0, 2.0, 34.0, 1.0, 30.0, 0.0, 33.0, 2.0, 31.0]);
        let smooth = track(&[0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0]);
        assert!(erratic_variance(&jittery, 10).unwrap() > 50.0);
        assert!(erratic_variance(&smooth, 10).unwrap() < 1.0);
    }
}
