//! Sample stream contract
//!
//! A [`SampleSource`] is whatever hands the estimator its samples: a decoded
//! file, a synthetic signal, or a test fixture. Samples are a single flat
//! stream of signed integers; interleaved channels are not separated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors describing an unusable sample stream format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Unsupported bit depth: {0} (expected 8, 16, 24 or 32)")]
    UnsupportedBitDepth(u16),
}

/// Integer sample width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitDepth {
    Eight,
    Sixteen,
    TwentyFour,
    ThirtyTwo,
}

impl BitDepth {
    /// Bits per sample
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::TwentyFour => 24,
            BitDepth::ThirtyTwo => 32,
        }
    }

    /// Full-scale amplitude, `2^(bits - 1)`
    ///
    /// # Example
    /// ```
    /// use dbfs_probe_core::loudness::source::BitDepth;
    ///
    /// assert_eq!(BitDepth::Sixteen.full_scale_amplitude(), 32768.0);
    /// ```
    pub fn full_scale_amplitude(self) -> f64 {
        (1u64 << (self.bits() - 1)) as f64
    }

    /// Largest positive sample value
    pub fn max_sample(self) -> i32 {
        ((1i64 << (self.bits() - 1)) - 1) as i32
    }

    /// Most negative sample value
    pub fn min_sample(self) -> i32 {
        (-(1i64 << (self.bits() - 1))) as i32
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = SourceError;

    fn try_from(bits: u16) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            24 => Ok(BitDepth::TwentyFour),
            32 => Ok(BitDepth::ThirtyTwo),
            other => Err(SourceError::UnsupportedBitDepth(other)),
        }
    }
}

/// A flat, randomly addressable stream of integer samples
pub trait SampleSource {
    /// Total number of samples
    fn len(&self) -> usize;

    /// Sample at a zero-based index
    ///
    /// Callers only pass indices below [`Self::len`].
    fn sample(&self, index: usize) -> i32;

    /// Maximum representable magnitude for the stream's bit depth
    fn full_scale_amplitude(&self) -> f64;

    /// Frames per second
    fn frame_rate(&self) -> u32;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of samples covering `seconds` at the frame rate, rounded up
    fn samples_for_duration(&self, seconds: f64) -> u64 {
        (seconds * f64::from(self.frame_rate())).ceil() as u64
    }

    /// Convert a sample count to milliseconds at the frame rate
    fn samples_to_ms(&self, samples: f64) -> f64 {
        samples * 1000.0 / f64::from(self.frame_rate())
    }
}

/// In-memory sample stream
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<i32>,
    bit_depth: BitDepth,
    frame_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<i32>, bit_depth: BitDepth, frame_rate: u32) -> Self {
        Self {
            samples,
            bit_depth,
            frame_rate,
        }
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }
}

impl SampleSource for SampleBuffer {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn sample(&self, index: usize) -> i32 {
        self.samples[index]
    }

    fn full_scale_amplitude(&self) -> f64 {
        self.bit_depth.full_scale_amplitude()
    }

    fn frame_rate(&self) -> u32 {
        self.frame_rate
    }
}
