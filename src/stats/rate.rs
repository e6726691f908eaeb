//! Weighted rate estimation for 0/1 indicators.

use crate::domain::{RateEstimate, Sample};
use crate::error::WaveError;

/// Weighted share of 1-valued observations, as a rounded percentage.
///
/// The sample's values must be 0/1 indicator encodings; for the unemployment
/// rate the caller restricts the sample to labor-force participants before
/// calling. Rounding is half-up (away from zero, Rust's `f64::round`),
/// applied uniformly to all indicators.
///
/// Fails with `EmptySample` when no observations remain (e.g. a wave with
/// zero labor-force participants in the filtered subregion); that situation
/// is a data-quality signal for the caller, not a zero.
pub fn weighted_rate(sample: &Sample, decimals: u32) -> Result<RateEstimate, WaveError> {
    if sample.is_empty() {
        return Err(WaveError::EmptySample);
    }

    let mut total_weight = 0.0;
    let mut weighted_sum = 0.0;
    for (&v, &w) in sample.values().iter().zip(sample.weights()) {
        if !w.is_finite() || w < 0.0 {
            return Err(WaveError::InvalidWeight(w));
        }
        total_weight += w;
        weighted_sum += v * w;
    }
    if total_weight <= 0.0 {
        return Err(WaveError::EmptySample);
    }

    let percent = round_to(weighted_sum / total_weight * 100.0, decimals);
    Ok(RateEstimate { percent, decimals })
}

pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example_activity_rate() {
        // Weighted mean 15/25 = 0.6 -> 60.0%.
        let sample = Sample::from_pairs(&[(1.0, 10.0), (0.0, 10.0), (1.0, 5.0)]);
        assert_eq!(weighted_rate(&sample, 1).unwrap().percent, 60.0);
    }

    #[test]
    fn all_ones_is_hundred() {
        let sample = Sample::from_pairs(&[(1.0, 3.0), (1.0, 7.5)]);
        assert_eq!(weighted_rate(&sample, 2).unwrap().percent, 100.0);
    }

    #[test]
    fn all_zeros_is_zero() {
        let sample = Sample::from_pairs(&[(0.0, 3.0), (0.0, 7.5)]);
        assert_eq!(weighted_rate(&sample, 2).unwrap().percent, 0.0);
    }

    #[test]
    fn rounds_to_requested_decimals() {
        // 1/3 -> 33.333...%
        let sample = Sample::from_pairs(&[(1.0, 1.0), (0.0, 2.0)]);
        assert_eq!(weighted_rate(&sample, 1).unwrap().percent, 33.3);
        assert_eq!(weighted_rate(&sample, 2).unwrap().percent, 33.33);
    }

    #[test]
    fn empty_sample_fails() {
        assert_eq!(weighted_rate(&Sample::new(), 1), Err(WaveError::EmptySample));
    }

    #[test]
    fn zero_total_weight_fails() {
        let sample = Sample::from_pairs(&[(1.0, 0.0)]);
        assert_eq!(weighted_rate(&sample, 1), Err(WaveError::EmptySample));
    }

    #[test]
    fn negative_weight_fails() {
        let sample = Sample::from_pairs(&[(1.0, 1.0), (0.0, -2.0)]);
        assert_eq!(
            weighted_rate(&sample, 1),
            Err(WaveError::InvalidWeight(-2.0))
        );
    }

    #[test]
    fn display_uses_requested_precision() {
        let sample = Sample::from_pairs(&[(1.0, 1.0), (0.0, 1.0)]);
        let rate = weighted_rate(&sample, 2).unwrap();
        assert_eq!(rate.to_string(), "50.00");
    }
}
