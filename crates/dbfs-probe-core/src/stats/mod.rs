//! Statistics over experiment results
//!
//! Provides summary statistics across trials and decimated running-dBFS traces.

pub mod summary;
pub mod trace;
