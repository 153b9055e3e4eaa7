//! dbfs-probe - Subset loudness estimation
//!
//! This library re-exports the sampling, estimation and experiment
//! functionality from `dbfs-probe-core`. The `dbfs-probe` binary drives it
//! over synthetic signals.

pub use dbfs_probe_core::experiment;
pub use dbfs_probe_core::loudness;
pub use dbfs_probe_core::sampling;
pub use dbfs_probe_core::signal;
pub use dbfs_probe_core::stats;

pub use dbfs_probe_core::{
    run_positional, run_random_subset, true_dbfs, BitDepth, EstimatorError, ExperimentConfig,
    ExperimentError, IndexRange, IndexSampler, LoudnessEstimator, SampleBuffer, SampleSource,
    SamplerError, SignalGenerator, SignalKind,
};
pub use dbfs_probe_core::{DEFAULT_ERROR_FACTOR, DEFAULT_FRAME_RATE, VERSION};
