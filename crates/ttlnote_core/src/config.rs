//! Core runtime configuration.
//!
//! # Responsibility
//! - Carry lifecycle timing constants and storage keys as one value.
//! - Parse optional JSON overrides supplied by the host.
//!
//! # Invariants
//! - A validated config has positive durations.
//! - `warning_window_ms < lifespan_ms`.
//! - `snapshot_key` is non-empty.
//! - `log_level` names a level the file logger accepts.

use crate::logging::{default_log_level, init_logging, parse_level, LoggingError};
use crate::model::note::{EXPIRATION_WARNING_WINDOW_MS, NOTE_LIFESPAN_MS};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

/// Default key of the single persisted notes snapshot.
pub const DEFAULT_SNAPSHOT_KEY: &str = "notes";
/// Nominal sweep period.
pub const DEFAULT_SWEEP_PERIOD_MS: u64 = 1_000;
/// Display-only de-noising threshold for the "Modified" line.
pub const DEFAULT_MODIFIED_DISPLAY_THRESHOLD_MS: i64 = 1_000;

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::Invalid(message) => write!(f, "invalid config value: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Runtime settings for the lifecycle engine and its ambient services.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// How long a non-archived note lives after its last reset.
    pub lifespan_ms: i64,
    /// Width of the one-time expiration warning window before the deadline.
    pub warning_window_ms: i64,
    /// Nominal period of the background sweep.
    pub sweep_period_ms: u64,
    /// Key of the snapshot row holding the notes array.
    pub snapshot_key: String,
    /// `modified_at` must exceed `created_at` by more than this to be shown.
    pub modified_display_threshold_ms: i64,
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            lifespan_ms: NOTE_LIFESPAN_MS,
            warning_window_ms: EXPIRATION_WARNING_WINDOW_MS,
            sweep_period_ms: DEFAULT_SWEEP_PERIOD_MS,
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            modified_display_threshold_ms: DEFAULT_MODIFIED_DISPLAY_THRESHOLD_MS,
            log_level: default_log_level().to_string(),
        }
    }
}

impl CoreConfig {
    /// Parses a JSON document; missing keys fall back to defaults.
    ///
    /// # Errors
    /// - `Parse` for malformed JSON or unknown keys.
    /// - `Invalid` when the parsed values fail `validate()`.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lifespan_ms <= 0 {
            return Err(ConfigError::Invalid(format!(
                "lifespan_ms must be positive, got {}",
                self.lifespan_ms
            )));
        }
        if self.warning_window_ms <= 0 {
            return Err(ConfigError::Invalid(format!(
                "warning_window_ms must be positive, got {}",
                self.warning_window_ms
            )));
        }
        if self.warning_window_ms >= self.lifespan_ms {
            return Err(ConfigError::Invalid(format!(
                "warning_window_ms ({}) must be shorter than lifespan_ms ({})",
                self.warning_window_ms, self.lifespan_ms
            )));
        }
        if self.sweep_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "sweep_period_ms must be positive".to_string(),
            ));
        }
        if self.snapshot_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "snapshot_key must not be empty".to_string(),
            ));
        }
        if parse_level(&self.log_level).is_err() {
            return Err(ConfigError::Invalid(format!(
                "log_level `{}` is not one of trace|debug|info|warn|error",
                self.log_level
            )));
        }
        if self.modified_display_threshold_ms < 0 {
            return Err(ConfigError::Invalid(format!(
                "modified_display_threshold_ms must not be negative, got {}",
                self.modified_display_threshold_ms
            )));
        }
        Ok(())
    }

    pub fn sweep_period(&self) -> Duration {
        Duration::from_millis(self.sweep_period_ms)
    }

    /// Starts file logging under `log_dir` at the configured `log_level`.
    pub fn init_logging(&self, log_dir: impl AsRef<Path>) -> Result<(), LoggingError> {
        init_logging(&self.log_level, log_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};

    #[test]
    fn empty_document_matches_defaults() {
        assert_eq!(
            CoreConfig::from_json_str("{}").unwrap(),
            CoreConfig::default()
        );
    }

    #[test]
    fn defaults_use_thirty_days_and_five_minutes() {
        let config = CoreConfig::default();
        assert_eq!(config.lifespan_ms, 2_592_000_000);
        assert_eq!(config.warning_window_ms, 300_000);
        assert_eq!(config.sweep_period_ms, 1_000);
        assert_eq!(config.snapshot_key, "notes");
    }

    #[test]
    fn partial_document_overrides_only_given_keys() {
        let config = CoreConfig::from_json_str(r#"{"sweep_period_ms": 250}"#).unwrap();
        assert_eq!(config.sweep_period_ms, 250);
        assert_eq!(config.lifespan_ms, CoreConfig::default().lifespan_ms);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = CoreConfig::from_json_str(r#"{"lifespan_days": 3}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_warning_window_not_shorter_than_lifespan() {
        let err = CoreConfig::from_json_str(r#"{"lifespan_ms": 1000, "warning_window_ms": 1000}"#)
            .unwrap_err();
        assert!(err.to_string().contains("must be shorter"));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let err = CoreConfig::from_json_str(r#"{"log_level": "verbose"}"#).unwrap_err();
        assert!(err.to_string().contains("verbose"));
        assert!(CoreConfig::from_json_str(r#"{"log_level": "WARN"}"#).is_ok());
    }

    #[test]
    fn rejects_blank_snapshot_key() {
        let err = CoreConfig::from_json_str(r#"{"snapshot_key": "  "}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
