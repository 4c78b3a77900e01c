use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How position `points_per_round` picks its round denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundBasis {
    /// Total play observations / seats per trick / distinct versions, across
    /// the whole run. A rough estimate, not a count of completed rounds.
    #[default]
    Approximate,
    /// Per-version count of attacking/defending victory events.
    Exact,
}

/// Tunables for one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub round_basis: RoundBasis,
    #[serde(default = "AnalysisConfig::default_seats_per_trick")]
    pub seats_per_trick: u32,
    #[serde(default = "AnalysisConfig::default_warn_limit")]
    pub warn_limit: usize,
    #[serde(default = "AnalysisConfig::default_log_extension")]
    pub log_extension: String,
}

impl AnalysisConfig {
    const MAX_SEATS: u32 = 8;

    #[must_use]
    pub const fn default_seats_per_trick() -> u32 {
        4
    }

    #[must_use]
    pub const fn default_warn_limit() -> usize {
        5
    }

    #[must_use]
    pub fn default_log_extension() -> String {
        "log".to_string()
    }

    /// Parse a configuration from JSON, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for invalid JSON and any validation error
    /// raised by [`AnalysisConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=Self::MAX_SEATS).contains(&self.seats_per_trick) {
            return Err(ConfigError::RangeViolation {
                field: "seats_per_trick",
                min: 1,
                max: u64::from(Self::MAX_SEATS),
                value: u64::from(self.seats_per_trick),
            });
        }
        let extension = self.log_extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\']) {
            return Err(ConfigError::InvalidExtension(self.log_extension.clone()));
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            round_basis: RoundBasis::default(),
            seats_per_trick: Self::default_seats_per_trick(),
            warn_limit: Self::default_warn_limit(),
            log_extension: Self::default_log_extension(),
        }
    }
}

/// Errors raised when analysis configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: u64,
        max: u64,
        value: u64,
    },
    #[error("log extension {0:?} is not a plain file extension")]
    InvalidExtension(String),
    #[error("config could not be parsed: {0}")]
    Parse(String),
}
