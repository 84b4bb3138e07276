//! One-shot gas-quality baseline.
//!
//! After [`WARM_UP_SAMPLES`] readings the current gas-quality window mean is
//! frozen as the room's reference. It is never recomputed; only a session
//! reset clears it.

use tracing::info;

/// Samples required before the baseline is captured.
pub const WARM_UP_SAMPLES: u64 = 10;

/// Tracks the warm-up and holds the frozen baseline.
#[derive(Debug, Clone)]
pub struct BaselineEstimator {
    warm_up: u64,
    baseline: Option<f64>,
}

impl BaselineEstimator {
    /// Create an estimator with the default warm-up.
    pub fn new() -> Self {
        Self::with_warm_up(WARM_UP_SAMPLES)
    }

    /// Create an estimator that captures after `warm_up` samples.
    pub fn with_warm_up(warm_up: u64) -> Self {
        Self {
            warm_up,
            baseline: None,
        }
    }

    /// Offer the running sample count and current gas-quality mean.
    ///
    /// Returns `true` only on the call that captures the baseline.
    pub fn update(&mut self, sample_count: u64, gas_average: Option<f64>) -> bool {
        if self.baseline.is_some() || sample_count < self.warm_up {
            return false;
        }
        let Some(average) = gas_average else {
            return false;
        };

        self.baseline = Some(average);
        info!(
            "Gas-quality baseline captured at sample {}: {:.1}",
            sample_count, average
        );
        true
    }

    /// Whether the baseline has been captured.
    pub fn is_ready(&self) -> bool {
        self.baseline.is_some()
    }

    /// The baseline rounded to whole raw units.
    pub fn value(&self) -> Option<u32> {
        self.baseline.map(|b| b.round().max(0.0) as u32)
    }

    /// Forget the baseline; the next warm-up starts from scratch.
    pub fn reset(&mut self) {
        self.baseline = None;
    }
}

impl Default for BaselineEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_before_warm_up() {
        let mut estimator = BaselineEstimator::new();
        for count in 1..WARM_UP_SAMPLES {
            assert!(!estimator.update(count, Some(100.0)));
        }
        assert!(!estimator.is_ready());
        assert_eq!(estimator.value(), None);
    }

    #[test]
    fn test_captured_exactly_once() {
        let mut estimator = BaselineEstimator::new();
        assert!(estimator.update(WARM_UP_SAMPLES, Some(150.4)));
        assert_eq!(estimator.value(), Some(150));

        // Later, different averages never move it.
        for count in WARM_UP_SAMPLES + 1..WARM_UP_SAMPLES + 100 {
            assert!(!estimator.update(count, Some(999.0)));
        }
        assert_eq!(estimator.value(), Some(150));
    }

    #[test]
    fn test_missing_average_defers_capture() {
        let mut estimator = BaselineEstimator::with_warm_up(2);
        assert!(!estimator.update(2, None));
        assert!(estimator.update(3, Some(80.6)));
        assert_eq!(estimator.value(), Some(81));
    }

    #[test]
    fn test_reset() {
        let mut estimator = BaselineEstimator::with_warm_up(1);
        estimator.update(1, Some(10.0));
        estimator.reset();
        assert!(!estimator.is_ready());
        assert!(estimator.update(1, Some(20.0)));
        assert_eq!(estimator.value(), Some(20));
    }
}
