//! Running dBFS traces
//!
//! Stores the running estimate after each consumed sample for later plotting.
//! Long runs can be decimated to keep only every Nth point.

use serde::Serialize;

/// A single point of a running estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TracePoint {
    /// Number of samples consumed when this estimate was taken (1-based)
    pub samples: u64,
    /// Running estimate in dBFS
    pub dbfs: f64,
}

/// Decimated sequence of running dBFS estimates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DbfsTrace {
    /// Keep one point every `decimation` samples
    decimation: u64,
    points: Vec<TracePoint>,
}

impl DbfsTrace {
    /// Create an empty trace keeping every `decimation`-th point
    ///
    /// A decimation of 0 is treated as 1.
    pub fn new(decimation: usize) -> Self {
        Self {
            decimation: decimation.max(1) as u64,
            points: Vec::new(),
        }
    }

    /// Record the estimate taken after `samples` samples
    ///
    /// The first sample is always kept, then every `decimation`-th.
    pub fn record(&mut self, samples: u64, dbfs: f64) {
        if samples > 0 && (samples - 1) % self.decimation == 0 {
            self.points.push(TracePoint { samples, dbfs });
        }
    }

    pub fn points(&self) -> &[TracePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn decimation(&self) -> u64 {
        self.decimation
    }

    /// Trace as `(samples, dbfs)` pairs for plotting
    pub fn plot_data(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.samples as f64, p.dbfs))
            .collect()
    }
}
