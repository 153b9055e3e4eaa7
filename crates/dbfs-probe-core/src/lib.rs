//! dbfs-probe Core - Subset sampling and incremental loudness estimation
//!
//! This library estimates the dBFS loudness of a flat sample stream from a
//! subset of its samples. Indices are drawn without replacement by
//! [`IndexSampler`] (or walked positionally) and folded into a
//! [`LoudnessEstimator`], whose running estimate is compared against the
//! true full-signal dBFS.
//!
//! Decoding is left to the caller: anything implementing
//! [`loudness::source::SampleSource`] can be measured.

pub mod experiment;
pub mod loudness;
pub mod sampling;
pub mod signal;
pub mod stats;

pub use experiment::{
    config::ExperimentConfig, positional::run_positional, random::run_random_subset,
    ExperimentError,
};
pub use loudness::{
    estimator::{true_dbfs, EstimatorError, LoudnessEstimator},
    source::{BitDepth, SampleBuffer, SampleSource},
};
pub use sampling::index_sampler::{IndexRange, IndexSampler, SamplerError};
pub use signal::{SignalGenerator, SignalKind};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default frame rate for synthetic signals (CD audio)
pub const DEFAULT_FRAME_RATE: u32 = 44100;

/// Default tolerance, in dB, for the "sample until close" stop predicate
pub const DEFAULT_ERROR_FACTOR: f64 = 0.2;
