//! Engine configuration structures.
//!
//! These structures define all configurable aspects of a store instance.
//! They are plain serde types so a driver can load them from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::DEFAULT_GC_INTERVAL_MS;
use crate::error::{KvError, KvResult};
use crate::types::IsolationLevel;

/// Main engine configuration.
///
/// # Example
///
/// ```rust
/// use mvkv_common::config::EngineConfig;
/// use mvkv_common::types::IsolationLevel;
///
/// let config = EngineConfig::from_toml_str(r#"
///     default_isolation = "read_committed"
///
///     [reclamation]
///     interval_ms = 250
/// "#).unwrap();
///
/// assert_eq!(config.default_isolation, IsolationLevel::ReadCommitted);
/// assert!(config.reclamation.enabled);
/// assert_eq!(config.reclamation.interval_ms, 250);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Isolation level used by `begin()` when the caller does not pick one.
    #[serde(default)]
    pub default_isolation: IsolationLevel,

    /// Version reclamation configuration.
    #[serde(default)]
    pub reclamation: ReclamationConfig,
}

impl EngineConfig {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for testing.
    ///
    /// Background reclamation is disabled so tests drive it explicitly.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            default_isolation: IsolationLevel::default(),
            reclamation: ReclamationConfig {
                enabled: false,
                ..Default::default()
            },
        }
    }

    /// Returns a copy with a different default isolation level.
    #[must_use]
    pub fn with_default_isolation(mut self, level: IsolationLevel) -> Self {
        self.default_isolation = level;
        self
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> KvResult<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> KvResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded engine configuration");
        Ok(config)
    }

    /// Serializes the configuration to TOML text.
    pub fn to_toml(&self) -> KvResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| KvError::invalid_config(format!("failed to serialize: {e}")))
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> KvResult<()> {
        if !self.default_isolation.is_supported() {
            return Err(KvError::UnsupportedIsolation {
                level: self.default_isolation,
            });
        }

        if self.reclamation.enabled && self.reclamation.interval_ms == 0 {
            return Err(KvError::invalid_config(
                "reclamation.interval_ms must be greater than zero",
            ));
        }

        Ok(())
    }
}

/// Version reclamation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReclamationConfig {
    /// Run reclamation on a background thread.
    /// Default: true
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Interval between background passes in milliseconds.
    /// Default: 100
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    DEFAULT_GC_INTERVAL_MS
}

impl Default for ReclamationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl ReclamationConfig {
    /// Returns the pass interval as a `Duration`.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
