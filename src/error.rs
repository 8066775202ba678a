//! Error taxonomy for the matchmaking scheduler.
//!
//! Only configuration problems are recoverable errors surfaced to the
//! caller. Invariant violations (dequeuing a group without a formable
//! group, occupying a non-empty slot) are logic defects and panic instead.

use thiserror::Error;

/// Rejected scheduler configuration. The scheduler never starts when
/// construction fails with one of these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("concurrency cap must be positive")]
    NonPositiveCap,

    #[error("minimum run duration must be positive")]
    NonPositiveDuration,

    #[error("minimum run duration {min}s exceeds maximum {max}s")]
    InvertedDurationRange { min: u64, max: u64 },
}
