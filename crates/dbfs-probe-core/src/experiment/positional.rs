//! Positional-subset loudness walks
//!
//! Runs the start, middle and end walks in lockstep, one sample per walk per
//! step, each with its own estimator. In until-close mode a walk stops
//! consuming samples once it converges; the run ends when every walk has
//! converged or the sample cap is reached.

use super::config::ExperimentConfig;
use super::{check_source, sample_cap, ExperimentError};
use crate::loudness::estimator::{true_dbfs, LoudnessEstimator};
use crate::loudness::source::SampleSource;
use crate::sampling::positional::Walk;
use crate::stats::trace::DbfsTrace;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of a single positional walk
#[derive(Debug, Clone, Serialize)]
pub struct WalkOutcome {
    pub walk: Walk,
    /// Samples folded in before the walk stopped
    pub samples_used: u64,
    /// Running estimate when the walk stopped, in dBFS
    pub final_dbfs: f64,
    /// Whether the final estimate is within the error factor of the truth
    pub converged: bool,
    pub trace: Option<DbfsTrace>,
}

/// Results of a positional run
#[derive(Debug, Clone, Serialize)]
pub struct PositionalReport {
    pub timestamp: DateTime<Utc>,
    pub true_dbfs: f64,
    pub until_close: bool,
    /// Maximum steps any walk could take
    pub sample_cap: u64,
    pub frame_rate: u32,
    /// One outcome per walk, in [`Walk::ALL`] order
    pub walks: Vec<WalkOutcome>,
}

impl PositionalReport {
    /// Outcome of a particular walk
    pub fn walk(&self, walk: Walk) -> Option<&WalkOutcome> {
        self.walks.iter().find(|w| w.walk == walk)
    }
}

struct WalkState {
    walk: Walk,
    estimator: LoudnessEstimator,
    trace: Option<DbfsTrace>,
    done: bool,
}

/// Run the three positional walks over a source
///
/// Unlike random trials there is no minimum-sample floor: a walk may stop
/// as soon as its running estimate is within tolerance.
///
/// # Errors
/// - [`ExperimentError::InvalidConfig`] if the config fails validation
/// - [`ExperimentError::EmptySource`] if the source has no samples
/// - [`ExperimentError::ZeroFrameRate`] if the source has no frame rate
pub fn run_positional<S>(
    source: &S,
    config: &ExperimentConfig,
) -> Result<PositionalReport, ExperimentError>
where
    S: SampleSource + ?Sized,
{
    config.validate()?;
    check_source(source)?;

    let truth = true_dbfs(source)?;
    let cap = sample_cap(source, config);
    let total = source.len();

    tracing::info!(
        cap,
        total,
        true_dbfs = truth,
        until_close = config.until_close,
        "Starting positional run"
    );

    let mut states: Vec<WalkState> = Walk::ALL
        .iter()
        .map(|&walk| WalkState {
            walk,
            estimator: LoudnessEstimator::for_source(source),
            trace: config
                .keep_traces
                .then(|| DbfsTrace::new(config.trace_decimation)),
            done: false,
        })
        .collect();

    for step in 0..cap as usize {
        for state in states.iter_mut().filter(|s| !s.done) {
            let index = state.walk.index_at(step, total);
            state.estimator.fold_in(source.sample(index));

            if let Some(trace) = state.trace.as_mut() {
                trace.record(
                    state.estimator.sample_count(),
                    state.estimator.current_dbfs()?,
                );
            }

            if config.until_close && state.estimator.has_converged(truth, config.error_factor)? {
                tracing::debug!(
                    walk = %state.walk,
                    samples = state.estimator.sample_count(),
                    "Walk converged"
                );
                state.done = true;
            }
        }

        if states.iter().all(|s| s.done) {
            break;
        }
    }

    let walks = states
        .into_iter()
        .map(|state| -> Result<WalkOutcome, ExperimentError> {
            Ok(WalkOutcome {
                walk: state.walk,
                samples_used: state.estimator.sample_count(),
                final_dbfs: state.estimator.current_dbfs()?,
                converged: state.done
                    || state.estimator.has_converged(truth, config.error_factor)?,
                trace: state.trace,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if config.until_close && walks.iter().any(|w| !w.converged) {
        tracing::warn!(cap, "Positional walk hit the sample cap without converging");
    }

    Ok(PositionalReport {
        timestamp: Utc::now(),
        true_dbfs: truth,
        until_close: config.until_close,
        sample_cap: cap,
        frame_rate: source.frame_rate(),
        walks,
    })
}
