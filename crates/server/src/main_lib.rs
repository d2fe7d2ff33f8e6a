use std::sync::Arc;

use portfolio_tracker_core::PortfolioTracker;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub tracker: Arc<PortfolioTracker>,
}

impl AppState {
    pub fn new(tracker: PortfolioTracker) -> Arc<Self> {
        Arc::new(Self {
            tracker: Arc::new(tracker),
        })
    }
}

pub fn init_tracing() {
    let fmt_layer = fmt::layer().json().with_current_span(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let tracker = match &config.holdings_file {
        Some(path) => {
            tracing::info!("Loading holdings from {}", path.display());
            PortfolioTracker::from_holdings_file(path, config.tracker.clone())?
        }
        None => PortfolioTracker::with_default_holdings(config.tracker.clone()),
    };
    tracing::info!(
        holdings = tracker.holdings().len(),
        sectors = tracker.sectors().len(),
        providers = ?tracker.provider_names(),
        "Portfolio tracker ready"
    );
    Ok(AppState::new(tracker))
}
