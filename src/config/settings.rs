//! Sync-layer settings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default page origin when none is configured.
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8081";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Funnel estimate heuristics.
///
/// Presentation constants with no measured derivation; kept configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelConfig {
    pub raw_multiplier: u64,
    pub raw_floor: u64,
    pub incident_ratio: f64,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            raw_multiplier: 10,
            raw_floor: 50_000,
            incident_ratio: 0.4,
        }
    }
}

/// Settings for one dashboard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Page origin; HTTP endpoints and the push endpoint derive from it.
    pub origin: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub poll_interval_ms: u64,
    pub marker_lifetime_ms: u64,
    pub max_markers: usize,
    pub max_decisions: usize,
    pub max_graph_nodes: usize,
    pub max_visible_notifications: usize,
    pub notification_duration_ms: u64,
    pub frame_interval_ms: u64,
    pub physics_steps_per_tick: usize,
    pub funnel: FunnelConfig,
    pub mitre_top_n: usize,
    pub request_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            max_retries: 5,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 30_000,
            poll_interval_ms: 5_000,
            marker_lifetime_ms: 10_000,
            max_markers: 50,
            max_decisions: 10,
            max_graph_nodes: 60,
            max_visible_notifications: 5,
            notification_duration_ms: 5_000,
            frame_interval_ms: 33,
            physics_steps_per_tick: 4,
            funnel: FunnelConfig::default(),
            mitre_top_n: 5,
            request_timeout_ms: 10_000,
        }
    }
}

impl SyncConfig {
    /// Load from an optional JSON file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        log::info!(
            "CONFIG_LOADED origin={} max_retries={} poll_interval_ms={} source={}",
            config.origin,
            config.max_retries,
            config.poll_interval_ms,
            path.map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults".to_string())
        );

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Apply `THREATLENS_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(origin) = lookup("THREATLENS_ORIGIN") {
            self.origin = origin;
        }
        if let Some(raw) = lookup("THREATLENS_POLL_INTERVAL_MS") {
            self.poll_interval_ms = raw.parse().map_err(|_| ConfigError::Invalid {
                key: "THREATLENS_POLL_INTERVAL_MS",
                reason: format!("not an integer: {}", raw),
            })?;
        }
        if let Some(raw) = lookup("THREATLENS_MAX_RETRIES") {
            self.max_retries = raw.parse().map_err(|_| ConfigError::Invalid {
                key: "THREATLENS_MAX_RETRIES",
                reason: format!("not an integer: {}", raw),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("backoff_base_ms", self.backoff_base_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("marker_lifetime_ms", self.marker_lifetime_ms),
            ("frame_interval_ms", self.frame_interval_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ];
        for (key, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if self.backoff_cap_ms < self.backoff_base_ms {
            return Err(ConfigError::Invalid {
                key: "backoff_cap_ms",
                reason: format!(
                    "cap {} is below base {}",
                    self.backoff_cap_ms, self.backoff_base_ms
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.funnel.incident_ratio) {
            return Err(ConfigError::Invalid {
                key: "funnel.incident_ratio",
                reason: format!("{} is outside [0, 1]", self.funnel.incident_ratio),
            });
        }
        if self.mitre_top_n == 0 {
            return Err(ConfigError::Invalid {
                key: "mitre_top_n",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_visible_notifications == 0 {
            return Err(ConfigError::Invalid {
                key: "max_visible_notifications",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn marker_lifetime(&self) -> Duration {
        Duration::from_millis(self.marker_lifetime_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
