use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;
use portfolio_tracker_core::models::settings::TrackerSettings;

pub struct Config {
    pub listen_addr: SocketAddr,
    /// Holdings JSON; the built-in list is used when unset.
    pub holdings_file: Option<PathBuf>,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub tracker: TrackerSettings,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset numeric values fall back to defaults;
    /// values that are set but malformed are rejected.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let listen_addr: SocketAddr = lookup("PT_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid PT_LISTEN_ADDR")?;
        let holdings_file = lookup("PT_HOLDINGS_FILE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let cors_allow = lookup("PT_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = parse_or(&lookup, "PT_REQUEST_TIMEOUT_MS", 30_000)?;

        let mut tracker = TrackerSettings::default();
        tracker.fetch_timeout_ms = parse_or(&lookup, "PT_FETCH_TIMEOUT_MS", tracker.fetch_timeout_ms)?;
        tracker.retry.max_retries = parse_or(&lookup, "PT_MAX_RETRIES", tracker.retry.max_retries)?;
        tracker.refresh_interval_secs =
            parse_or(&lookup, "PT_REFRESH_INTERVAL_SECS", tracker.refresh_interval_secs)?;
        tracker.stale_after_secs = parse_or(&lookup, "PT_STALE_SECS", tracker.stale_after_secs)?;
        if tracker.refresh_interval_secs == 0 {
            anyhow::bail!("PT_REFRESH_INTERVAL_SECS must be greater than zero");
        }

        Ok(Self {
            listen_addr,
            holdings_file,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            tracker,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key}: {raw}")),
        _ => Ok(default),
    }
}
