//! Index selection for subset loudness estimation
//!
//! This module contains the two ways a subset of sample indices is chosen:
//! - Uniform random draws without replacement ([`index_sampler`])
//! - Deterministic start/middle/end walks ([`positional`])

pub mod index_sampler;
pub mod positional;
