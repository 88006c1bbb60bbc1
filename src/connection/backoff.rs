//! Reconnect backoff policy.

use std::time::Duration;

use crate::config::SyncConfig;

/// Exponential backoff: `min(base * 2^attempt, cap)` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_ms: u64,
    pub cap_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_ms: 1_000,
            cap_ms: 30_000,
        }
    }
}

impl ReconnectPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_ms: config.backoff_base_ms,
            cap_ms: config.backoff_cap_ms,
        }
    }

    /// Delay before reconnect attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let ms = self.base_ms.saturating_mul(factor).min(self.cap_ms);
        Duration::from_millis(ms)
    }

    /// Whether another attempt is allowed after `attempts` so far.
    pub fn allows(&self, attempts: u32) -> bool {
        attempts < self.max_retries
    }
}
