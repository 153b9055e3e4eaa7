//! Subset loudness experiments
//!
//! Wires index selection and loudness estimation together and measures how
//! close subset estimates get to the true loudness, and how many samples
//! that takes:
//! - Experiment settings ([`config`])
//! - Repeated random-subset trials ([`random`])
//! - Start/middle/end positional walks ([`positional`])

pub mod config;
pub mod positional;
pub mod random;

use crate::loudness::estimator::EstimatorError;
use crate::loudness::source::SampleSource;
use crate::sampling::index_sampler::SamplerError;
use config::ExperimentConfig;
use thiserror::Error;

/// Errors that can occur while running an experiment
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExperimentError {
    #[error("Sample source is empty")]
    EmptySource,

    #[error("Sample source reports a frame rate of 0")]
    ZeroFrameRate,

    #[error("Invalid experiment configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Sampler(#[from] SamplerError),

    #[error(transparent)]
    Estimator(#[from] EstimatorError),
}

/// Reject sources no experiment can run on
///
/// The frame rate turns durations into sample caps and sample counts into
/// milliseconds, so it must be non-zero.
pub fn check_source<S: SampleSource + ?Sized>(source: &S) -> Result<(), ExperimentError> {
    if source.is_empty() {
        return Err(ExperimentError::EmptySource);
    }
    if source.frame_rate() == 0 {
        return Err(ExperimentError::ZeroFrameRate);
    }
    Ok(())
}

/// Maximum number of samples a single trial or walk may consume
///
/// The whole source in until-close mode, otherwise the configured duration
/// rounded up to whole samples. Always clamped to `max_samples` and to the
/// source length.
pub fn sample_cap<S: SampleSource + ?Sized>(source: &S, config: &ExperimentConfig) -> u64 {
    let total = source.len() as u64;
    let requested = if config.until_close {
        total
    } else {
        source.samples_for_duration(config.duration_secs)
    };

    let cap = requested.min(config.max_samples).min(total);
    if cap < requested {
        tracing::debug!(requested, cap, total, "Sample cap clamped");
    }
    cap
}
