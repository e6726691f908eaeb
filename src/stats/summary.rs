//! Full weighted distribution summary for one variable.

use std::collections::HashMap;

use crate::domain::{Sample, WeightedStatistics};
use crate::error::WaveError;
use crate::stats::quantile::SortedSample;

const QUARTILE_FRACTIONS: [f64; 3] = [0.25, 0.5, 0.75];

/// Reduce a sample to a [`WeightedStatistics`] record.
///
/// Pure function of its input: mean and all quantiles are weight-aware;
/// mode, min and max are unweighted (see `domain` docs for why). The sample
/// is sorted internally once and the sorted order is reused for the median,
/// quartiles and deciles; the mode is computed over the original input order
/// so its first-occurrence tie-break is preserved.
pub fn summarize(sample: &Sample) -> Result<WeightedStatistics, WaveError> {
    let sorted = SortedSample::new(sample)?;

    let mut weighted_sum = 0.0;
    for (&v, &w) in sample.values().iter().zip(sample.weights()) {
        weighted_sum += v * w;
    }
    let mean = weighted_sum / sorted.total_weight();

    let median = sorted.quantile(0.5);
    let quartiles = QUARTILE_FRACTIONS
        .iter()
        .map(|&p| (p, sorted.quantile(p)))
        .collect();
    let deciles = (1..=9)
        .map(|d| {
            let p = f64::from(d) / 10.0;
            (p, sorted.quantile(p))
        })
        .collect();

    let mode = unweighted_mode(sample.values());
    let min = sample.values().iter().copied().fold(f64::INFINITY, f64::min);
    let max = sample
        .values()
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(WeightedStatistics {
        mean,
        median,
        mode,
        quartiles,
        deciles,
        min,
        max,
    })
}

/// Most frequent raw value, ties broken by first occurrence in input order.
fn unweighted_mode(values: &[f64]) -> f64 {
    let mut counts: HashMap<u64, (usize, usize)> = HashMap::new();
    for (idx, &v) in values.iter().enumerate() {
        let entry = counts.entry(v.to_bits()).or_insert((0, idx));
        entry.0 += 1;
    }

    let mut best = (0usize, usize::MAX, 0.0f64);
    for (&bits, &(count, first)) in &counts {
        if count > best.0 || (count == best.0 && first < best.1) {
            best = (count, first, f64::from_bits(bits));
        }
    }
    best.2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::weighted_quantile;

    fn income_sample() -> Sample {
        Sample::from_pairs(&[(100.0, 1.0), (200.0, 1.0), (300.0, 2.0)])
    }

    #[test]
    fn worked_example_mean_and_median() {
        let stats = summarize(&income_sample()).unwrap();
        assert_eq!(stats.mean, 225.0);
        assert_eq!(stats.median, 200.0);
        assert_eq!(stats.min, 100.0);
        assert_eq!(stats.max, 300.0);
    }

    #[test]
    fn median_equals_half_quantile_by_construction() {
        let sample = Sample::from_pairs(&[(5.0, 2.5), (1.0, 1.0), (9.0, 0.5), (3.0, 4.0)]);
        let stats = summarize(&sample).unwrap();
        assert_eq!(stats.median, weighted_quantile(&sample, 0.5).unwrap());
        let (frac, q2) = stats.quartiles[1];
        assert_eq!(frac, 0.5);
        assert_eq!(q2, stats.median);
    }

    #[test]
    fn quantiles_stay_within_extrema() {
        let sample = Sample::from_pairs(&[(14.0, 3.0), (2.0, 1.0), (77.0, 2.0), (30.0, 5.0)]);
        let stats = summarize(&sample).unwrap();
        for &(_, q) in stats.quartiles.iter().chain(&stats.deciles) {
            assert!(stats.min <= q && q <= stats.max);
        }
        for p in [0.0, 0.33, 0.66, 1.0] {
            let q = weighted_quantile(&sample, p).unwrap();
            assert!(stats.min <= q && q <= stats.max);
        }
    }

    #[test]
    fn deciles_are_keyed_by_fraction() {
        let stats = summarize(&income_sample()).unwrap();
        assert_eq!(stats.deciles.len(), 9);
        assert_eq!(stats.deciles[0].0, 0.1);
        assert_eq!(stats.deciles[8].0, 0.9);
    }

    #[test]
    fn mode_is_unweighted() {
        // 100 appears twice with tiny weights; 300 once with a huge weight.
        let sample = Sample::from_pairs(&[(100.0, 0.1), (300.0, 50.0), (100.0, 0.1)]);
        let stats = summarize(&sample).unwrap();
        assert_eq!(stats.mode, 100.0);
    }

    #[test]
    fn mode_tie_breaks_by_first_occurrence() {
        let sample = Sample::from_pairs(&[(7.0, 1.0), (3.0, 1.0), (3.0, 1.0), (7.0, 1.0)]);
        assert_eq!(summarize(&sample).unwrap().mode, 7.0);

        let reversed = Sample::from_pairs(&[(3.0, 1.0), (7.0, 1.0), (7.0, 1.0), (3.0, 1.0)]);
        assert_eq!(summarize(&reversed).unwrap().mode, 3.0);
    }

    #[test]
    fn mean_is_scale_invariant_in_weights() {
        let base = Sample::from_pairs(&[(10.0, 1.0), (20.0, 3.0)]);
        let scaled = Sample::from_pairs(&[(10.0, 4.0), (20.0, 12.0)]);
        let a = summarize(&base).unwrap();
        let b = summarize(&scaled).unwrap();
        assert!((a.mean - b.mean).abs() < 1e-12);
        assert_eq!(a.median, b.median);
    }

    #[test]
    fn empty_sample_fails() {
        assert_eq!(summarize(&Sample::new()), Err(WaveError::EmptySample));
    }
}
