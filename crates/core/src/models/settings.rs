use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime knobs for quote fetching and refresh scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Upper bound for a single provider attempt, in milliseconds.
    pub fetch_timeout_ms: u64,

    /// Backoff policy applied per holding when a lookup fails transiently.
    pub retry: RetryPolicy,

    /// How long a cached snapshot is served before it is considered stale.
    pub stale_after_secs: u64,

    /// Period of the background refresh task.
    pub refresh_interval_secs: u64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 10_000,
            retry: RetryPolicy::default(),
            stale_after_secs: 15,
            refresh_interval_secs: 15,
        }
    }
}

impl TrackerSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Exponential backoff: attempt `n` (0-based) waits `min(base * 2^n, max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 disables retrying).
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay to wait before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let ms = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}
