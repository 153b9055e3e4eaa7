//! Synthetic test signal generation
//!
//! Produces integer sample buffers with known loudness, so the estimators can
//! be exercised without a decoder. Signals are deterministic for a given seed.

use crate::loudness::source::{BitDepth, SampleBuffer};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

/// Length of one burst cycle in seconds (100ms)
const BURST_CYCLE_SECS: f64 = 0.1;

/// Fraction of each burst cycle that is silent
const BURST_SILENCE_RATIO: f64 = 0.9;

/// Default amplitude relative to full scale (-6dB to leave headroom)
const DEFAULT_AMPLITUDE: f64 = 0.5;

/// Errors raised for unusable generator parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("Invalid signal parameter: {0}")]
    InvalidParameter(String),
}

/// Waveform to synthesize
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum SignalKind {
    /// Pure tone
    Sine { frequency_hz: f64 },
    /// Alternating +/- amplitude every sample
    Square,
    /// Uniform white noise
    Noise,
    /// White noise for the last 10ms of every 100ms, silence otherwise
    Burst,
    /// Digital silence
    Silence,
}

/// Deterministic generator of synthetic sample buffers
///
/// # Example
/// ```
/// use dbfs_probe_core::loudness::estimator::true_dbfs;
/// use dbfs_probe_core::loudness::source::BitDepth;
/// use dbfs_probe_core::signal::{SignalGenerator, SignalKind};
///
/// let buffer = SignalGenerator::new(SignalKind::Square, 44100, BitDepth::Sixteen)
///     .with_amplitude(0.5)
///     .generate(0.1)
///     .unwrap();
/// assert!((true_dbfs(&buffer).unwrap() + 6.02).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    kind: SignalKind,
    frame_rate: u32,
    bit_depth: BitDepth,
    /// Peak amplitude relative to full scale (0.0 to 1.0)
    amplitude: f64,
    /// Seed for noise-based signals
    seed: u64,
}

impl SignalGenerator {
    pub fn new(kind: SignalKind, frame_rate: u32, bit_depth: BitDepth) -> Self {
        Self {
            kind,
            frame_rate,
            bit_depth,
            amplitude: DEFAULT_AMPLITUDE,
            seed: 0,
        }
    }

    /// Set the peak amplitude relative to full scale
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Set the seed used by noise-based signals
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Generate `duration_secs` worth of samples
    ///
    /// # Errors
    /// [`SignalError::InvalidParameter`] for a zero frame rate, an amplitude
    /// outside `0.0..=1.0`, a negative or non-finite duration, or a sine
    /// frequency outside `(0, frame_rate / 2]`.
    pub fn generate(&self, duration_secs: f64) -> Result<SampleBuffer, SignalError> {
        self.validate(duration_secs)?;

        let count = (duration_secs * f64::from(self.frame_rate)).round() as usize;
        let peak = self.amplitude * f64::from(self.bit_depth.max_sample());
        let rate = f64::from(self.frame_rate);

        let samples: Vec<i32> = match self.kind {
            SignalKind::Sine { frequency_hz } => (0..count)
                .map(|n| self.quantize(peak * (2.0 * PI * frequency_hz * n as f64 / rate).sin()))
                .collect(),
            SignalKind::Square => (0..count)
                .map(|n| self.quantize(if n % 2 == 0 { peak } else { -peak }))
                .collect(),
            SignalKind::Noise => {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
                (0..count)
                    .map(|_| self.quantize(peak * rng.random_range(-1.0..=1.0)))
                    .collect()
            }
            SignalKind::Burst => {
                let cycle = ((rate * BURST_CYCLE_SECS) as usize).max(1);
                let burst_start = (cycle as f64 * BURST_SILENCE_RATIO) as usize;
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
                (0..count)
                    .map(|n| {
                        if n % cycle >= burst_start {
                            self.quantize(peak * rng.random_range(-1.0..=1.0))
                        } else {
                            0
                        }
                    })
                    .collect()
            }
            SignalKind::Silence => vec![0; count],
        };

        tracing::debug!(
            kind = ?self.kind,
            samples = samples.len(),
            frame_rate = self.frame_rate,
            "Generated synthetic signal"
        );

        Ok(SampleBuffer::new(samples, self.bit_depth, self.frame_rate))
    }

    fn validate(&self, duration_secs: f64) -> Result<(), SignalError> {
        if self.frame_rate == 0 {
            return Err(SignalError::InvalidParameter(
                "frame rate must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(SignalError::InvalidParameter(format!(
                "amplitude {} outside 0.0..=1.0",
                self.amplitude
            )));
        }
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(SignalError::InvalidParameter(format!(
                "duration {} must be a non-negative number of seconds",
                duration_secs
            )));
        }
        if let SignalKind::Sine { frequency_hz } = self.kind {
            let nyquist = f64::from(self.frame_rate) / 2.0;
            if !(frequency_hz > 0.0 && frequency_hz <= nyquist) {
                return Err(SignalError::InvalidParameter(format!(
                    "sine frequency {} Hz outside (0, {}]",
                    frequency_hz, nyquist
                )));
            }
        }
        Ok(())
    }

    fn quantize(&self, value: f64) -> i32 {
        let min = f64::from(self.bit_depth.min_sample());
        let max = f64::from(self.bit_depth.max_sample());
        value.round().clamp(min, max) as i32
    }
}
