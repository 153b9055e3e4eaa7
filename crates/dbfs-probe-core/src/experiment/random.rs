//! Random-subset loudness trials
//!
//! Each trial draws sample indices without replacement, folds the samples
//! into a fresh estimator, and records where the running estimate ends up.
//! Trials are independent and run in parallel.

use super::config::ExperimentConfig;
use super::{check_source, sample_cap, ExperimentError};
use crate::loudness::estimator::{true_dbfs, LoudnessEstimator};
use crate::loudness::source::SampleSource;
use crate::sampling::index_sampler::{IndexRange, IndexSampler};
use crate::stats::summary::Summary;
use crate::stats::trace::DbfsTrace;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

/// Result of a single random-subset trial
#[derive(Debug, Clone, Serialize)]
pub struct TrialOutcome {
    /// Trial number (0-based)
    pub trial: usize,
    /// Samples folded in before the trial stopped
    pub samples_used: u64,
    /// Running estimate when the trial stopped, in dBFS
    pub final_dbfs: f64,
    /// Whether the final estimate is within the error factor of the truth
    pub converged: bool,
    /// Running estimate after each sample, when traces are kept
    pub trace: Option<DbfsTrace>,
}

impl TrialOutcome {
    /// Absolute difference from the true loudness, in dB
    pub fn error(&self, true_dbfs: f64) -> f64 {
        (self.final_dbfs - true_dbfs).abs()
    }
}

/// Aggregated results of a random-subset run
#[derive(Debug, Clone, Serialize)]
pub struct RandomSubsetReport {
    /// When the run finished
    pub timestamp: DateTime<Utc>,
    /// Loudness of the whole source, in dBFS
    pub true_dbfs: f64,
    /// Whether trials stopped at convergence
    pub until_close: bool,
    /// Maximum samples a trial could consume
    pub sample_cap: u64,
    pub frame_rate: u32,
    pub trials: Vec<TrialOutcome>,
    /// Final estimates across trials
    pub dbfs_summary: Option<Summary>,
    /// Absolute errors of the final estimates
    pub error_summary: Option<Summary>,
    /// Samples consumed per trial
    pub samples_summary: Option<Summary>,
    /// Samples consumed per trial, in milliseconds of audio
    pub samples_ms_summary: Option<Summary>,
    /// Number of trials whose final estimate converged
    pub converged_trials: usize,
}

/// Run one random-subset trial with the given random source
///
/// Draws up to `cap` distinct indices. In until-close mode the trial stops as
/// soon as more than `min_samples` samples have been consumed and the running
/// estimate is within `error_factor` of `truth`.
pub fn run_random_trial<S, R>(
    source: &S,
    truth: f64,
    cap: u64,
    config: &ExperimentConfig,
    trial: usize,
    rng: R,
) -> Result<TrialOutcome, ExperimentError>
where
    S: SampleSource + ?Sized,
    R: Rng,
{
    let draws = i64::try_from(cap)
        .map_err(|_| ExperimentError::InvalidConfig(format!("sample cap {} too large", cap)))?;
    let range = IndexRange::try_from(source.len())?;
    let sampler = IndexSampler::with_rng(range, Some(draws), rng)?;

    let mut estimator = LoudnessEstimator::for_source(source);
    let mut trace = config
        .keep_traces
        .then(|| DbfsTrace::new(config.trace_decimation));
    let mut stopped_early = false;

    for index in sampler {
        estimator.fold_in(source.sample(index as usize));
        let samples = estimator.sample_count();

        if let Some(trace) = trace.as_mut() {
            trace.record(samples, estimator.current_dbfs()?);
        }

        if config.until_close
            && samples > config.min_samples
            && estimator.has_converged(truth, config.error_factor)?
        {
            stopped_early = true;
            break;
        }
    }

    let outcome = TrialOutcome {
        trial,
        samples_used: estimator.sample_count(),
        final_dbfs: estimator.current_dbfs()?,
        converged: stopped_early || estimator.has_converged(truth, config.error_factor)?,
        trace,
    };

    tracing::debug!(
        trial,
        samples = outcome.samples_used,
        dbfs = outcome.final_dbfs,
        converged = outcome.converged,
        "Random trial finished"
    );

    Ok(outcome)
}

/// Run `repeat_random` independent random-subset trials over a source
///
/// With a configured seed, trial `t` uses a ChaCha RNG seeded with
/// `seed + t`, so the report is reproducible regardless of thread
/// scheduling. Without one, each trial seeds from the OS.
///
/// # Errors
/// - [`ExperimentError::InvalidConfig`] if the config fails validation
/// - [`ExperimentError::EmptySource`] if the source has no samples
/// - [`ExperimentError::ZeroFrameRate`] if the source has no frame rate
pub fn run_random_subset<S>(
    source: &S,
    config: &ExperimentConfig,
) -> Result<RandomSubsetReport, ExperimentError>
where
    S: SampleSource + Sync + ?Sized,
{
    config.validate()?;
    check_source(source)?;

    let truth = true_dbfs(source)?;
    let cap = sample_cap(source, config);

    tracing::info!(
        trials = config.repeat_random,
        cap,
        total = source.len(),
        true_dbfs = truth,
        until_close = config.until_close,
        "Starting random-subset run"
    );

    let trials = (0..config.repeat_random)
        .into_par_iter()
        .map(|trial| match config.seed {
            Some(seed) => {
                let rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(trial as u64));
                run_random_trial(source, truth, cap, config, trial, rng)
            }
            None => run_random_trial(source, truth, cap, config, trial, StdRng::from_os_rng()),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let finals: Vec<f64> = trials.iter().map(|t| t.final_dbfs).collect();
    let errors: Vec<f64> = trials.iter().map(|t| t.error(truth)).collect();
    let counts: Vec<u64> = trials.iter().map(|t| t.samples_used).collect();
    let converged_trials = trials.iter().filter(|t| t.converged).count();

    let samples_summary = Summary::from_counts(&counts);
    let ms_per_sample = source.samples_to_ms(1.0);

    if config.until_close && converged_trials < trials.len() {
        tracing::warn!(
            converged = converged_trials,
            trials = trials.len(),
            cap,
            "Some trials hit the sample cap without converging"
        );
    }

    let report = RandomSubsetReport {
        timestamp: Utc::now(),
        true_dbfs: truth,
        until_close: config.until_close,
        sample_cap: cap,
        frame_rate: source.frame_rate(),
        dbfs_summary: Summary::from_values(&finals),
        error_summary: Summary::from_values(&errors),
        samples_ms_summary: samples_summary.map(|s| s.scaled(ms_per_sample)),
        samples_summary,
        converged_trials,
        trials,
    };

    tracing::info!(
        converged = report.converged_trials,
        mean_dbfs = report.dbfs_summary.map(|s| s.mean),
        "Random-subset run complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loudness::source::{BitDepth, SampleBuffer};
    use crate::signal::{SignalGenerator, SignalKind};

    fn noise(seconds: f64) -> SampleBuffer {
        SignalGenerator::new(SignalKind::Noise, 8000, BitDepth::Sixteen)
            .with_seed(42)
            .generate(seconds)
            .unwrap()
    }

    #[test]
    fn test_fixed_cap_trial_consumes_cap() {
        let source = noise(1.0);
        let truth = true_dbfs(&source).unwrap();
        let config = ExperimentConfig::default();

        let outcome =
            run_random_trial(&source, truth, 800, &config, 0, ChaCha8Rng::seed_from_u64(1))
                .unwrap();
        assert_eq!(outcome.samples_used, 800);
        assert!(outcome.trace.is_none());
        assert!(outcome.error(truth) < 1.0);
    }

    #[test]
    fn test_until_close_respects_min_samples() {
        let source = noise(1.0);
        let truth = true_dbfs(&source).unwrap();
        let config = ExperimentConfig {
            until_close: true,
            min_samples: 250,
            error_factor: 3.0,
            ..Default::default()
        };

        for seed in 0..10 {
            let outcome = run_random_trial(
                &source,
                truth,
                8000,
                &config,
                0,
                ChaCha8Rng::seed_from_u64(seed),
            )
            .unwrap();
            assert!(outcome.converged);
            assert!(outcome.samples_used > 250);
            assert!(outcome.error(truth) < 3.0);
        }
    }

    #[test]
    fn test_whole_source_draw_reaches_truth() {
        let source = noise(0.5);
        let truth = true_dbfs(&source).unwrap();
        let config = ExperimentConfig {
            keep_traces: true,
            ..Default::default()
        };

        let outcome = run_random_trial(
            &source,
            truth,
            source.len() as u64,
            &config,
            3,
            ChaCha8Rng::seed_from_u64(5),
        )
        .unwrap();
        assert_eq!(outcome.trial, 3);
        assert!((outcome.final_dbfs - truth).abs() < 1e-9);

        let trace = outcome.trace.unwrap();
        assert_eq!(trace.len(), source.len());
        assert_eq!(trace.points().last().unwrap().dbfs, outcome.final_dbfs);
    }

    #[test]
    fn test_seeded_run_is_reproducible() {
        let source = noise(1.0);
        let config = ExperimentConfig {
            repeat_random: 8,
            duration_secs: 0.05,
            seed: Some(77),
            ..Default::default()
        };

        let a = run_random_subset(&source, &config).unwrap();
        let b = run_random_subset(&source, &config).unwrap();
        let finals = |r: &RandomSubsetReport| r.trials.iter().map(|t| t.final_dbfs).collect::<Vec<_>>();
        assert_eq!(finals(&a), finals(&b));
        assert_eq!(a.sample_cap, 400);
        assert_eq!(a.trials.len(), 8);
    }

    #[test]
    fn test_report_summaries() {
        let source = noise(1.0);
        let config = ExperimentConfig {
            repeat_random: 5,
            duration_secs: 0.1,
            seed: Some(1),
            ..Default::default()
        };

        let report = run_random_subset(&source, &config).unwrap();
        let dbfs = report.dbfs_summary.unwrap();
        assert_eq!(dbfs.count, 5);
        assert!(dbfs.min <= dbfs.mean && dbfs.mean <= dbfs.max);

        let samples = report.samples_summary.unwrap();
        assert_eq!(samples.min, 800.0);
        assert_eq!(samples.max, 800.0);
        assert_eq!(report.samples_ms_summary.unwrap().mean, 100.0);
    }

    #[test]
    fn test_silent_source_never_converges() {
        let source = SampleBuffer::new(vec![0; 500], BitDepth::Sixteen, 1000);
        let config = ExperimentConfig {
            until_close: true,
            repeat_random: 2,
            seed: Some(0),
            ..Default::default()
        };

        let report = run_random_subset(&source, &config).unwrap();
        assert_eq!(report.converged_trials, 0);
        assert!(report.trials.iter().all(|t| t.samples_used == 500));
        assert_eq!(report.true_dbfs, f64::NEG_INFINITY);
        assert_eq!(report.dbfs_summary.unwrap().std_dev, None);
    }

    #[test]
    fn test_empty_source_rejected() {
        let source = SampleBuffer::new(Vec::new(), BitDepth::Sixteen, 1000);
        let err = run_random_subset(&source, &ExperimentConfig::default()).unwrap_err();
        assert_eq!(err, ExperimentError::EmptySource);
    }

    #[test]
    fn test_zero_frame_rate_rejected() {
        let source = SampleBuffer::new(vec![100; 1000], BitDepth::Sixteen, 0);
        let config = ExperimentConfig {
            seed: Some(1),
            ..Default::default()
        };
        assert_eq!(
            run_random_subset(&source, &config).unwrap_err(),
            ExperimentError::ZeroFrameRate
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let source = noise(0.1);
        let config = ExperimentConfig {
            repeat_random: 0,
            ..Default::default()
        };
        assert!(matches!(
            run_random_subset(&source, &config),
            Err(ExperimentError::InvalidConfig(_))
        ));
    }
}
