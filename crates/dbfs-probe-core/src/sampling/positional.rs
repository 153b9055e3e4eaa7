//! Deterministic positional walks over a sample stream
//!
//! Three walks traverse the same samples in lockstep: forward from the first
//! sample, forward from the midpoint (wrapping past the end), and backward
//! from the last sample.

use serde::Serialize;
use std::fmt;

/// Starting point and direction of a positional walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Walk {
    /// Forward from index 0
    Start,
    /// Forward from `total / 2`, wrapping to 0
    Middle,
    /// Backward from `total - 1`
    End,
}

impl Walk {
    /// All walks in report order
    pub const ALL: [Walk; 3] = [Walk::Start, Walk::Middle, Walk::End];

    /// Index visited at step `step` of a walk over `total` samples
    ///
    /// `step` must be below `total`.
    ///
    /// # Example
    /// ```
    /// use dbfs_probe_core::sampling::positional::Walk;
    ///
    /// assert_eq!(Walk::Start.index_at(0, 10), 0);
    /// assert_eq!(Walk::Middle.index_at(7, 10), 2);
    /// assert_eq!(Walk::End.index_at(0, 10), 9);
    /// ```
    pub fn index_at(self, step: usize, total: usize) -> usize {
        debug_assert!(step < total, "step {} out of range {}", step, total);
        match self {
            Walk::Start => step,
            Walk::Middle => (step + total / 2) % total,
            Walk::End => total - (step + 1),
        }
    }

    /// Iterator over the first `count` indices of this walk
    pub fn indices(self, count: usize, total: usize) -> impl Iterator<Item = usize> {
        (0..count.min(total)).map(move |step| self.index_at(step, total))
    }
}

impl fmt::Display for Walk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Walk::Start => "Start",
            Walk::Middle => "Middle",
            Walk::End => "End",
        };
        f.pad(name)
    }
}
