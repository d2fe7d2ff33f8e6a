pub mod data;
pub mod errors;
pub mod format;
pub mod models;
pub mod providers;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use models::{
    holding::{EnrichedHolding, Holding, HoldingSortField, SortDirection},
    quote::QuoteOutcome,
    settings::TrackerSettings,
    summary::PortfolioSnapshot,
};
use providers::registry::QuoteProviderRegistry;
use services::{
    quote_service::QuoteService,
    refresh_service::{RefreshController, SchedulerHandle},
    valuation_service::{quotes_by_name, ValuationService},
};

use errors::CoreError;

/// Main entry point for the Portfolio Tracker core library.
/// Holds the static holding set and all services needed to value it.
#[must_use]
pub struct PortfolioTracker {
    quote_service: Arc<QuoteService>,
    valuation_service: ValuationService,
    refresh: Arc<RefreshController>,
    settings: TrackerSettings,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("holdings", &self.holdings().len())
            .field("providers", &self.quote_service.provider_names())
            .field("cached_snapshots", &self.refresh.cache_len())
            .field("settings", &self.settings)
            .finish()
    }
}

impl PortfolioTracker {
    /// Tracker over the built-in holding set with the default providers.
    pub fn with_default_holdings(settings: TrackerSettings) -> Self {
        Self::new(
            data::default_holdings(),
            QuoteProviderRegistry::new_with_defaults(),
            settings,
        )
    }

    /// Tracker over holdings loaded from a JSON file, with the default providers.
    pub fn from_holdings_file(
        path: impl AsRef<Path>,
        settings: TrackerSettings,
    ) -> Result<Self, CoreError> {
        let holdings = data::load_holdings_from_file(path)?;
        Ok(Self::new(
            holdings,
            QuoteProviderRegistry::new_with_defaults(),
            settings,
        ))
    }

    /// Tracker over any holdings and provider set (tests, custom sources).
    pub fn new(
        holdings: Vec<Holding>,
        registry: QuoteProviderRegistry,
        settings: TrackerSettings,
    ) -> Self {
        let quote_service = Arc::new(QuoteService::new(registry, settings.clone()));
        let refresh = Arc::new(RefreshController::new(
            holdings,
            Arc::clone(&quote_service),
            settings.stale_after(),
        ));

        Self {
            quote_service,
            valuation_service: ValuationService::new(),
            refresh,
            settings,
        }
    }

    // ── Holdings ────────────────────────────────────────────────────

    /// The static holding set, in configured order.
    #[must_use]
    pub fn holdings(&self) -> &[Holding] {
        self.refresh.holdings()
    }

    /// Names of every holding, the default request for a live snapshot.
    #[must_use]
    pub fn holding_names(&self) -> Vec<String> {
        self.holdings().iter().map(|h| h.name.clone()).collect()
    }

    /// Distinct sector labels in order of first appearance.
    #[must_use]
    pub fn sectors(&self) -> Vec<&str> {
        let mut sectors: Vec<&str> = Vec::new();
        for holding in self.holdings() {
            if !sectors.contains(&holding.sector.as_str()) {
                sectors.push(&holding.sector);
            }
        }
        sectors
    }

    #[must_use]
    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    // ── Snapshots ───────────────────────────────────────────────────

    /// Investment-only view without any external calls.
    #[must_use]
    pub fn static_snapshot(&self) -> PortfolioSnapshot {
        self.valuation_service.static_snapshot(self.holdings())
    }

    /// Fetch quotes for `names` and value the full holding set against them.
    /// Always fetches; use [`cached_snapshot`](Self::cached_snapshot) for the cached path.
    pub async fn live_snapshot(&self, names: &[String]) -> PortfolioSnapshot {
        let outcomes = self.fetch_quotes(names).await;
        self.valuation_service
            .aggregate(self.holdings(), &quotes_by_name(outcomes))
    }

    /// Snapshot for `names` from the refresh cache, refreshing it if stale.
    pub async fn cached_snapshot(&self, names: &[String]) -> Arc<PortfolioSnapshot> {
        self.refresh.get_or_refresh(names).await
    }

    /// Snapshot for every holding from the refresh cache.
    pub async fn full_snapshot(&self) -> Arc<PortfolioSnapshot> {
        self.refresh.get_or_refresh(&self.holding_names()).await
    }

    /// Manual refresh of every holding, superseding a scheduled one.
    pub async fn refresh_now(&self) -> Arc<PortfolioSnapshot> {
        self.refresh.force_refresh(&self.holding_names()).await
    }

    /// Drop all cached snapshots.
    pub fn invalidate_cache(&self) {
        self.refresh.invalidate_all();
    }

    /// Start refreshing every holding on the configured interval.
    pub fn start_scheduler(&self) -> SchedulerHandle {
        self.refresh
            .spawn_scheduler(self.holding_names(), self.settings.refresh_interval())
    }

    // ── Quotes ──────────────────────────────────────────────────────

    /// One outcome per requested name, in request order.
    pub async fn fetch_quotes(&self, names: &[String]) -> Vec<QuoteOutcome> {
        self.quote_service.fetch_quotes(names).await
    }

    /// Names of the registered quote and fundamentals providers.
    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        self.quote_service.provider_names()
    }

    // ── Sorting ─────────────────────────────────────────────────────

    /// Sort holdings for display (stable).
    pub fn sort_holdings(
        &self,
        holdings: &mut [EnrichedHolding],
        field: HoldingSortField,
        direction: SortDirection,
    ) {
        self.valuation_service
            .sort_holdings(holdings, field, direction);
    }
}
