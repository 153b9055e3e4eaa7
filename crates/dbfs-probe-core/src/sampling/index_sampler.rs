//! Without-replacement random index generation
//!
//! Produces a uniformly random permutation prefix of an integer range using a
//! virtual Fisher-Yates shuffle. Only the swaps that actually happen are kept,
//! in a sparse displacement pool, so memory grows with the number of draws
//! rather than the size of the range.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::iter::FusedIterator;
use std::ops::Range;
use thiserror::Error;

/// Errors raised when constructing an [`IndexSampler`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SamplerError {
    #[error("Invalid index range: [{low}, {high}) contains no indices")]
    InvalidRange { low: i64, high: i64 },

    #[error("Invalid draw count: requested {requested}, range holds {available}")]
    InvalidDrawCount { requested: i64, available: u64 },

    #[error("Index range of length {len} does not fit in i64")]
    RangeTooLarge { len: usize },
}

/// Half-open range of indices `[low, high)` to draw from
///
/// Converts from a bare length `n` (meaning `[0, n)`), a `(low, high)` pair,
/// or a `Range<i64>`. Lengths given as `usize` go through `TryFrom` and are
/// rejected rather than clamped when they exceed `i64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub low: i64,
    pub high: i64,
}

impl IndexRange {
    pub fn new(low: i64, high: i64) -> Self {
        Self { low, high }
    }

    /// Number of indices in the range, or `None` if it is empty or inverted
    pub fn size(&self) -> Option<u64> {
        (self.high > self.low).then(|| self.high.abs_diff(self.low))
    }
}

impl From<i64> for IndexRange {
    fn from(n: i64) -> Self {
        Self { low: 0, high: n }
    }
}

impl TryFrom<usize> for IndexRange {
    type Error = SamplerError;

    fn try_from(len: usize) -> Result<Self, Self::Error> {
        let high = i64::try_from(len).map_err(|_| SamplerError::RangeTooLarge { len })?;
        Ok(Self { low: 0, high })
    }
}

impl From<(i64, i64)> for IndexRange {
    fn from((low, high): (i64, i64)) -> Self {
        Self { low, high }
    }
}

impl From<Range<i64>> for IndexRange {
    fn from(range: Range<i64>) -> Self {
        Self {
            low: range.start,
            high: range.end,
        }
    }
}

/// Random index generator drawing without replacement
///
/// Each call to [`Iterator::next`] picks uniformly among the indices not yet
/// emitted. Logically this swaps a random remaining element with the element
/// at the moving low boundary and advances the boundary; physically only the
/// displaced slots are recorded.
///
/// The sampler is single-use: once `draws` indices have been emitted it keeps
/// returning `None`.
///
/// # Example
/// ```
/// use dbfs_probe_core::sampling::index_sampler::IndexSampler;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let rng = ChaCha8Rng::seed_from_u64(7);
/// let sampler = IndexSampler::with_rng(10i64, None, rng).unwrap();
/// let mut drawn: Vec<i64> = sampler.collect();
/// drawn.sort_unstable();
/// assert_eq!(drawn, (0..10).collect::<Vec<_>>());
/// ```
#[derive(Debug)]
pub struct IndexSampler<R = StdRng> {
    /// Lowest slot still in play (moves up by one per draw)
    low: i64,
    /// Highest slot in play (inclusive, fixed)
    last: i64,
    /// Total indices to emit before exhaustion
    draws: u64,
    /// Indices emitted so far
    emitted: u64,
    /// Slot -> value currently sitting there, for non-identity slots only
    pool: HashMap<i64, i64>,
    /// Uniform random source
    rng: R,
}

impl IndexSampler<StdRng> {
    /// Create a sampler backed by an OS-seeded standard RNG
    ///
    /// # Arguments
    /// * `range` - Range descriptor (`n`, `(low, high)` or `low..high`)
    /// * `draws` - Number of indices to emit (`None` for the whole range)
    pub fn new(range: impl Into<IndexRange>, draws: Option<i64>) -> Result<Self, SamplerError> {
        Self::with_rng(range, draws, StdRng::from_os_rng())
    }
}

impl<R: Rng> IndexSampler<R> {
    /// Create a sampler using the supplied random source
    ///
    /// # Errors
    /// - [`SamplerError::InvalidRange`] if `high <= low`
    /// - [`SamplerError::InvalidDrawCount`] if `draws` is negative or larger
    ///   than the range
    pub fn with_rng(
        range: impl Into<IndexRange>,
        draws: Option<i64>,
        rng: R,
    ) -> Result<Self, SamplerError> {
        let range = range.into();
        let size = range.size().ok_or(SamplerError::InvalidRange {
            low: range.low,
            high: range.high,
        })?;

        let draws = match draws {
            None => size,
            Some(k) => match u64::try_from(k) {
                Ok(k) if k <= size => k,
                _ => {
                    return Err(SamplerError::InvalidDrawCount {
                        requested: k,
                        available: size,
                    })
                }
            },
        };

        Ok(Self {
            low: range.low,
            last: range.high - 1,
            draws,
            emitted: 0,
            pool: HashMap::new(),
            rng,
        })
    }

    /// Number of indices emitted so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Number of indices left before exhaustion
    pub fn remaining(&self) -> u64 {
        self.draws - self.emitted
    }

    /// Whether every requested index has been emitted
    pub fn is_exhausted(&self) -> bool {
        self.emitted >= self.draws
    }

    /// Number of displaced slots currently recorded
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    fn draw(&mut self) -> i64 {
        let slot = self.rng.random_range(self.low..=self.last);
        let value = self.pool.get(&slot).copied().unwrap_or(slot);

        // The boundary slot leaves play; its occupant fills the drawn slot.
        let boundary = self.pool.remove(&self.low).unwrap_or(self.low);
        if slot != self.low {
            self.pool.insert(slot, boundary);
        }

        self.low += 1;
        self.emitted += 1;
        value
    }
}

impl<R: Rng> Iterator for IndexSampler<R> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        if self.is_exhausted() {
            return None;
        }
        Some(self.draw())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl<R: Rng> FusedIterator for IndexSampler<R> {}
