//! Environment configuration

use crate::tracker::DEFAULT_SUMMARY_INTERVAL;
use std::env;
use thiserror::Error;

pub const SUMMARY_INTERVAL_VAR: &str = "MINDCITY_SUMMARY_INTERVAL";
pub const LOG_LEVEL_VAR: &str = "MINDCITY_LOG_LEVEL";
pub const INSTANCE_ID_VAR: &str = "MINDCITY_INSTANCE_ID";

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("MINDCITY_SUMMARY_INTERVAL must be a positive integer, got `{0}`")]
    InvalidSummaryInterval(String),
}

/// Engine settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Tracker window size and summary cadence
    pub summary_interval: usize,
    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Fixed producer instance id; random per encoder when `None`
    pub instance_id: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            summary_interval: DEFAULT_SUMMARY_INTERVAL,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            instance_id: None,
        }
    }
}

impl EngineConfig {
    /// Read configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let summary_interval = match get(SUMMARY_INTERVAL_VAR) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidSummaryInterval(raw)),
            },
            None => DEFAULT_SUMMARY_INTERVAL,
        };

        Ok(Self {
            summary_interval,
            log_level: get(LOG_LEVEL_VAR).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            instance_id: get(INSTANCE_ID_VAR),
        })
    }
}
