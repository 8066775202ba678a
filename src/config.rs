//! Scheduler configuration and initial queue population.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Runtime parameters of the scheduler: how many groups may run at once and
/// the bounds of the uniformly sampled run duration (whole seconds).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of concurrently running groups (slot count).
    pub cap: usize,
    /// Minimum sampled run duration, in seconds.
    pub min_duration_secs: u64,
    /// Maximum sampled run duration, in seconds.
    pub max_duration_secs: u64,
}

impl SchedulerConfig {
    /// Build a validated configuration.
    pub fn new(cap: usize, min_duration_secs: u64, max_duration_secs: u64) -> Result<Self, ConfigError> {
        let config = Self {
            cap,
            min_duration_secs,
            max_duration_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the construction-time invariants: positive cap, positive
    /// minimum duration, min <= max.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cap == 0 {
            return Err(ConfigError::NonPositiveCap);
        }
        if self.min_duration_secs == 0 {
            return Err(ConfigError::NonPositiveDuration);
        }
        if self.min_duration_secs > self.max_duration_secs {
            return Err(ConfigError::InvertedDurationRange {
                min: self.min_duration_secs,
                max: self.max_duration_secs,
            });
        }
        Ok(())
    }
}

/// Initial per-role participant counts, supplied by the config collaborator
/// before the scheduler starts. Participant ids are minted monotonically
/// from 1 in declaration order: tanks, then healers, then damage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InitialRoster {
    pub tanks: u32,
    pub healers: u32,
    pub damage: u32,
}

impl InitialRoster {
    pub fn new(tanks: u32, healers: u32, damage: u32) -> Self {
        Self {
            tanks,
            healers,
            damage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config_passes() {
        let config = SchedulerConfig::new(3, 1, 5).unwrap();
        assert_eq!(config.cap, 3);
        assert_eq!(config.min_duration_secs, 1);
        assert_eq!(config.max_duration_secs, 5);
    }

    #[test]
    fn test_fixed_duration_range_is_valid() {
        assert!(SchedulerConfig::new(1, 2, 2).is_ok());
    }

    #[test]
    fn test_zero_cap_rejected() {
        assert_eq!(
            SchedulerConfig::new(0, 1, 5).unwrap_err(),
            ConfigError::NonPositiveCap
        );
    }

    #[test]
    fn test_zero_min_duration_rejected() {
        assert_eq!(
            SchedulerConfig::new(2, 0, 5).unwrap_err(),
            ConfigError::NonPositiveDuration
        );
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert_eq!(
            SchedulerConfig::new(2, 6, 5).unwrap_err(),
            ConfigError::InvertedDurationRange { min: 6, max: 5 }
        );
    }
}
