//! Runner configuration
//!
//! Cadence settings are explicit construction-time configuration, not
//! ambient globals. Stored as TOML under the platform config dir.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Timing configuration for [`OperationRunner`](crate::runner::OperationRunner)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Foreground poll cadence in milliseconds (bounded wait per wake)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Minimum wall-clock duration of a visible operation, in
    /// milliseconds. Near-instant operations are padded to this so the
    /// progress surface does not flicker.
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_min_duration_ms() -> u64 {
    200
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            min_duration_ms: default_min_duration_ms(),
        }
    }
}

impl RunnerConfig {
    /// Foreground poll cadence
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Minimum visible duration floor
    pub fn min_duration(&self) -> Duration {
        Duration::from_millis(self.min_duration_ms)
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cubedit").join("ops.toml"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path().ok_or("Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(&path, content).map_err(|e| format!("Failed to write config: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.min_duration(), Duration::from_millis(200));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: RunnerConfig = toml::from_str("poll_interval_ms = 50").unwrap();
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.min_duration_ms, 200);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = RunnerConfig {
            poll_interval_ms: 25,
            min_duration_ms: 400,
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let back: RunnerConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.poll_interval_ms, 25);
        assert_eq!(back.min_duration_ms, 400);
    }
}
