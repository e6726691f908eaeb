//! Weighted quantiles.
//!
//! The estimator is positional: sort observations by value ascending, compute
//! the running sum of weights in that order, and return the first value whose
//! cumulative weight reaches `p` times the total weight. Ties among equal
//! values are irrelevant because their weights accumulate together.
//!
//! Sorting dominates the cost (O(n log n)), so callers that need several
//! quantiles from one sample build a [`SortedSample`] once and reuse it.

use crate::domain::Sample;
use crate::error::WaveError;

/// A sample sorted by value with precomputed cumulative weights.
#[derive(Debug, Clone)]
pub struct SortedSample {
    values: Vec<f64>,
    cum_weights: Vec<f64>,
    total_weight: f64,
}

impl SortedSample {
    /// Sort a sample and validate its weights.
    ///
    /// Fails with `EmptySample` when the sample has no observations or its
    /// total weight is zero, and with `InvalidWeight` on any negative or
    /// non-finite weight. A weight of exactly zero is permitted; it simply
    /// contributes nothing to the cumulative sum.
    pub fn new(sample: &Sample) -> Result<Self, WaveError> {
        if sample.is_empty() {
            return Err(WaveError::EmptySample);
        }
        for &w in sample.weights() {
            if !w.is_finite() || w < 0.0 {
                return Err(WaveError::InvalidWeight(w));
            }
        }

        let mut order: Vec<usize> = (0..sample.len()).collect();
        order.sort_by(|&a, &b| {
            sample.values()[a]
                .partial_cmp(&sample.values()[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut values = Vec::with_capacity(sample.len());
        let mut cum_weights = Vec::with_capacity(sample.len());
        let mut running = 0.0;
        for idx in order {
            running += sample.weights()[idx];
            values.push(sample.values()[idx]);
            cum_weights.push(running);
        }

        if running <= 0.0 {
            return Err(WaveError::EmptySample);
        }

        Ok(Self {
            values,
            cum_weights,
            total_weight: running,
        })
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// The smallest observed value whose cumulative weight reaches
    /// `p * total_weight`.
    ///
    /// The lookup clamps to the last element so that floating-point rounding
    /// at `p == 1` cannot push the threshold past the full cumulative sum.
    pub fn quantile(&self, p: f64) -> f64 {
        let target = p * self.total_weight;
        let pos = self.cum_weights.partition_point(|&c| c < target);
        let pos = pos.min(self.values.len() - 1);
        self.values[pos]
    }
}

/// One-shot weighted quantile for callers that need a single `p`.
pub fn weighted_quantile(sample: &Sample, p: f64) -> Result<f64, WaveError> {
    Ok(SortedSample::new(sample)?.quantile(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example_median() {
        // Total weight 4, half-threshold 2, sorted cumulative weights [1,2,4].
        let sample = Sample::from_pairs(&[(100.0, 1.0), (200.0, 1.0), (300.0, 2.0)]);
        assert_eq!(weighted_quantile(&sample, 0.5).unwrap(), 200.0);
    }

    #[test]
    fn empty_sample_fails() {
        assert_eq!(
            weighted_quantile(&Sample::new(), 0.5),
            Err(WaveError::EmptySample)
        );
    }

    #[test]
    fn zero_total_weight_fails() {
        let sample = Sample::from_pairs(&[(1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(SortedSample::new(&sample).err(), Some(WaveError::EmptySample));
    }

    #[test]
    fn negative_weight_fails() {
        let sample = Sample::from_pairs(&[(1.0, 2.0), (2.0, -1.0)]);
        assert_eq!(
            SortedSample::new(&sample).err(),
            Some(WaveError::InvalidWeight(-1.0))
        );
    }

    #[test]
    fn zero_weight_contributes_nothing() {
        let with_zero = Sample::from_pairs(&[(1.0, 1.0), (5.0, 0.0), (9.0, 1.0)]);
        let without = Sample::from_pairs(&[(1.0, 1.0), (9.0, 1.0)]);
        let a = SortedSample::new(&with_zero).unwrap();
        let b = SortedSample::new(&without).unwrap();
        for p in [0.1, 0.25, 0.5, 0.75, 0.9] {
            assert_eq!(a.quantile(p), b.quantile(p));
        }
    }

    #[test]
    fn monotone_in_p() {
        let sample = Sample::from_pairs(&[
            (12.0, 3.0),
            (7.0, 1.0),
            (30.0, 2.0),
            (1.0, 5.0),
            (18.0, 0.5),
        ]);
        let sorted = SortedSample::new(&sample).unwrap();
        let mut prev = f64::NEG_INFINITY;
        for i in 0..=20 {
            let q = sorted.quantile(i as f64 / 20.0);
            assert!(q >= prev);
            prev = q;
        }
    }

    #[test]
    fn p_one_clamps_to_max() {
        let sample = Sample::from_pairs(&[(1.0, 0.1), (2.0, 0.2), (3.0, 0.3)]);
        let sorted = SortedSample::new(&sample).unwrap();
        assert_eq!(sorted.quantile(1.0), 3.0);
    }

    #[test]
    fn equal_weights_reduce_to_unweighted_percentile() {
        // With equal weights, the weighted quantile is the smallest value v
        // such that at least p*n observations are <= v.
        let sample = Sample::from_pairs(&[
            (10.0, 2.0),
            (20.0, 2.0),
            (30.0, 2.0),
            (40.0, 2.0),
            (50.0, 2.0),
        ]);
        let sorted = SortedSample::new(&sample).unwrap();
        assert_eq!(sorted.quantile(0.2), 10.0);
        assert_eq!(sorted.quantile(0.5), 30.0);
        assert_eq!(sorted.quantile(0.8), 40.0);
        assert_eq!(sorted.quantile(0.81), 50.0);
    }

    #[test]
    fn scale_invariance_of_weights() {
        let base = Sample::from_pairs(&[(3.0, 1.0), (1.0, 2.0), (4.0, 1.5), (1.5, 0.5)]);
        let scaled = Sample::from_pairs(
            &base
                .values()
                .iter()
                .zip(base.weights())
                .map(|(&v, &w)| (v, w * 37.5))
                .collect::<Vec<_>>(),
        );
        let a = SortedSample::new(&base).unwrap();
        let b = SortedSample::new(&scaled).unwrap();
        for p in [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0] {
            assert_eq!(a.quantile(p), b.quantile(p));
        }
    }
}
