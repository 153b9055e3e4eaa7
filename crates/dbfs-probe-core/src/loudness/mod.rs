//! Loudness measurement
//!
//! - Incremental RMS / dBFS estimation ([`estimator`])
//! - The sample stream contract supplied by a decoder ([`source`])

pub mod estimator;
pub mod source;
