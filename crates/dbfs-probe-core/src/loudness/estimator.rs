//! Incremental RMS and dBFS estimation
//!
//! Keeps an exact running sum of squared sample magnitudes so the estimate
//! can be queried after every sample without rescanning.

use super::source::SampleSource;
use thiserror::Error;

/// Errors raised when querying a [`LoudnessEstimator`]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorError {
    #[error("No samples have been folded in yet")]
    NoSamples,
}

/// Convert an RMS magnitude to dBFS
///
/// Returns negative infinity for a zero RMS (digital silence).
pub fn rms_to_dbfs(rms: f64, full_scale_amplitude: f64) -> f64 {
    if rms > 0.0 {
        20.0 * (rms / full_scale_amplitude).log10()
    } else {
        f64::NEG_INFINITY
    }
}

/// Running loudness statistics over a stream of integer samples
///
/// Squares of 32-bit samples are below 2^62 and accumulate into a `u128`,
/// so the sum is exact and independent of the order samples arrive in.
///
/// # Example
/// ```
/// use dbfs_probe_core::loudness::estimator::LoudnessEstimator;
///
/// let mut est = LoudnessEstimator::new(32768.0);
/// for s in [16384, -16384, 16384, -16384] {
///     est.fold_in(s);
/// }
/// assert_eq!(est.current_rms().unwrap(), 16384.0);
/// assert!((est.current_dbfs().unwrap() + 6.0206).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LoudnessEstimator {
    sum_of_squares: u128,
    sample_count: u64,
    full_scale_amplitude: f64,
}

impl LoudnessEstimator {
    /// Create an empty estimator for a stream with the given full-scale amplitude
    pub fn new(full_scale_amplitude: f64) -> Self {
        Self {
            sum_of_squares: 0,
            sample_count: 0,
            full_scale_amplitude,
        }
    }

    /// Create an empty estimator matching a sample source's bit depth
    pub fn for_source<S: SampleSource + ?Sized>(source: &S) -> Self {
        Self::new(source.full_scale_amplitude())
    }

    /// Fold one sample into the running statistics
    pub fn fold_in(&mut self, sample: impl Into<i32>) {
        let magnitude = u64::from(sample.into().unsigned_abs());
        self.sum_of_squares += u128::from(magnitude * magnitude);
        self.sample_count += 1;
    }

    /// Root mean square of the samples folded in so far
    pub fn current_rms(&self) -> Result<f64, EstimatorError> {
        if self.sample_count == 0 {
            return Err(EstimatorError::NoSamples);
        }
        Ok((self.sum_of_squares as f64 / self.sample_count as f64).sqrt())
    }

    /// Current loudness estimate in dBFS
    ///
    /// Negative infinity when every sample so far was zero.
    pub fn current_dbfs(&self) -> Result<f64, EstimatorError> {
        self.current_rms()
            .map(|rms| rms_to_dbfs(rms, self.full_scale_amplitude))
    }

    /// Whether the estimate is strictly within `error_factor` dB of `true_dbfs`
    pub fn has_converged(&self, true_dbfs: f64, error_factor: f64) -> Result<bool, EstimatorError> {
        Ok((self.current_dbfs()? - true_dbfs).abs() < error_factor)
    }

    pub fn sum_of_squares(&self) -> u128 {
        self.sum_of_squares
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn full_scale_amplitude(&self) -> f64 {
        self.full_scale_amplitude
    }
}

impl<S: Into<i32>> Extend<S> for LoudnessEstimator {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for sample in iter {
            self.fold_in(sample);
        }
    }
}

/// True loudness of a whole source in dBFS
///
/// # Errors
/// [`EstimatorError::NoSamples`] if the source is empty.
pub fn true_dbfs<S: SampleSource + ?Sized>(source: &S) -> Result<f64, EstimatorError> {
    let mut estimator = LoudnessEstimator::for_source(source);
    estimator.extend((0..source.len()).map(|i| source.sample(i)));
    estimator.current_dbfs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loudness::source::{BitDepth, SampleBuffer};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_empty_estimator_has_no_value() {
        let est = LoudnessEstimator::new(32768.0);
        assert_eq!(est.current_rms(), Err(EstimatorError::NoSamples));
        assert_eq!(est.current_dbfs(), Err(EstimatorError::NoSamples));
        assert_eq!(est.has_converged(-10.0, 0.2), Err(EstimatorError::NoSamples));
    }

    #[test]
    fn test_silence_is_negative_infinity() {
        let mut est = LoudnessEstimator::new(32768.0);
        est.extend([0i32; 4]);
        assert_eq!(est.current_rms().unwrap(), 0.0);
        assert_eq!(est.current_dbfs().unwrap(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_half_scale_square_wave() {
        let mut est = LoudnessEstimator::new(32768.0);
        est.extend([16384, -16384, 16384, -16384]);

        assert_eq!(est.sum_of_squares(), 4 * 16384u128 * 16384);
        assert_eq!(est.sample_count(), 4);
        assert_eq!(est.current_rms().unwrap(), 16384.0);
        assert_abs_diff_eq!(est.current_dbfs().unwrap(), -6.0206, epsilon = 1e-4);
    }

    #[test]
    fn test_accepts_narrow_sample_types() {
        let mut est = LoudnessEstimator::new(128.0);
        est.fold_in(-64i8);
        est.fold_in(64i16);
        assert_eq!(est.current_rms().unwrap(), 64.0);
    }

    #[test]
    fn test_extreme_32bit_samples_do_not_overflow() {
        let mut est = LoudnessEstimator::new(2147483648.0);
        for _ in 0..10_000 {
            est.fold_in(i32::MIN);
        }
        assert_eq!(est.current_rms().unwrap(), 2147483648.0);
        assert_abs_diff_eq!(est.current_dbfs().unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_order_insensitive() {
        let samples = [3, -700, 12000, -5, 0, 32767, -32768, 42];
        let mut forward = LoudnessEstimator::new(32768.0);
        forward.extend(samples);

        let mut backward = LoudnessEstimator::new(32768.0);
        backward.extend(samples.iter().rev().copied());

        assert_eq!(forward.sum_of_squares(), backward.sum_of_squares());
        assert_eq!(forward.current_dbfs(), backward.current_dbfs());
    }

    #[test]
    fn test_convergence_is_strict() {
        let mut est = LoudnessEstimator::new(32768.0);
        est.extend([16384, -16384]);
        let dbfs = est.current_dbfs().unwrap();

        assert!(est.has_converged(dbfs + 0.1, 0.2).unwrap());
        assert!(!est.has_converged(dbfs + 0.3, 0.2).unwrap());
        assert!(!est.has_converged(dbfs, 0.0).unwrap());
    }

    #[test]
    fn test_silence_never_converges() {
        let mut est = LoudnessEstimator::new(32768.0);
        est.fold_in(0);
        assert!(!est.has_converged(-20.0, 100.0).unwrap());
    }

    #[test]
    fn test_true_dbfs_of_buffer() {
        let buffer = SampleBuffer::new(vec![16384, -16384], BitDepth::Sixteen, 44100);
        assert_abs_diff_eq!(true_dbfs(&buffer).unwrap(), -6.0206, epsilon = 1e-4);

        let empty = SampleBuffer::new(Vec::new(), BitDepth::Sixteen, 44100);
        assert_eq!(true_dbfs(&empty), Err(EstimatorError::NoSamples));
    }

    #[test]
    fn test_rms_to_dbfs() {
        assert_eq!(rms_to_dbfs(32768.0, 32768.0), 0.0);
        assert_abs_diff_eq!(rms_to_dbfs(3276.8, 32768.0), -20.0, epsilon = 1e-9);
        assert_eq!(rms_to_dbfs(0.0, 32768.0), f64::NEG_INFINITY);
    }
}
