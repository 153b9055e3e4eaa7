//! Experiment configuration
//!
//! Settings shared by random-subset and positional runs. Stored as JSON; any
//! field missing from the file takes its default.

use super::ExperimentError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_error_factor() -> f64 {
    crate::DEFAULT_ERROR_FACTOR
}

fn default_repeat_random() -> usize {
    50
}

fn default_duration_secs() -> f64 {
    2.0
}

fn default_min_samples() -> u64 {
    100
}

fn default_max_samples() -> u64 {
    10_000_000
}

fn default_trace_decimation() -> usize {
    1
}

/// Settings for a subset loudness experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Keep sampling until the estimate is within `error_factor` of the truth
    #[serde(default)]
    pub until_close: bool,
    /// Convergence tolerance in dB
    #[serde(default = "default_error_factor")]
    pub error_factor: f64,
    /// Number of independent random-subset trials
    #[serde(default = "default_repeat_random")]
    pub repeat_random: usize,
    /// Amount of audio to subsample in fixed-cap mode, in seconds
    #[serde(default = "default_duration_secs")]
    pub duration_secs: f64,
    /// Samples a random trial must exceed before convergence is checked
    #[serde(default = "default_min_samples")]
    pub min_samples: u64,
    /// Hard ceiling on samples consumed per trial or walk
    #[serde(default = "default_max_samples")]
    pub max_samples: u64,
    /// Keep one trace point every N samples
    #[serde(default = "default_trace_decimation")]
    pub trace_decimation: usize,
    /// Record running-dBFS traces in the reports
    #[serde(default)]
    pub keep_traces: bool,
    /// Base seed for reproducible trials (None = OS entropy)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            until_close: false,
            error_factor: default_error_factor(),
            repeat_random: default_repeat_random(),
            duration_secs: default_duration_secs(),
            min_samples: default_min_samples(),
            max_samples: default_max_samples(),
            trace_decimation: default_trace_decimation(),
            keep_traces: false,
            seed: None,
        }
    }
}

impl ExperimentConfig {
    /// Check that the settings describe a runnable experiment
    pub fn validate(&self) -> Result<(), ExperimentError> {
        let invalid = |msg: String| Err(ExperimentError::InvalidConfig(msg));

        if !(self.error_factor.is_finite() && self.error_factor > 0.0) {
            return invalid(format!(
                "error_factor must be a positive number of dB, got {}",
                self.error_factor
            ));
        }
        // Until-close runs ignore the duration
        if !self.until_close && !(self.duration_secs.is_finite() && self.duration_secs > 0.0) {
            return invalid(format!(
                "duration_secs must be positive, got {}",
                self.duration_secs
            ));
        }
        if self.repeat_random == 0 {
            return invalid("repeat_random must be at least 1".to_string());
        }
        if self.max_samples == 0 {
            return invalid("max_samples must be at least 1".to_string());
        }
        if self.trace_decimation == 0 {
            return invalid("trace_decimation must be at least 1".to_string());
        }
        Ok(())
    }

    /// Load a config from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        tracing::info!(path = %path.display(), "Loaded experiment config");
        Ok(config)
    }

    /// Save config to disk, creating parent directories if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Experiment config saved");
        Ok(())
    }
}
