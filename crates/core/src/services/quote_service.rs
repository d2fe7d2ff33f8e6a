use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::errors::CoreError;
use crate::models::quote::{Fundamentals, MarketQuote, QuoteOutcome};
use crate::models::settings::{RetryPolicy, TrackerSettings};
use crate::providers::registry::QuoteProviderRegistry;
use crate::services::earnings::normalize_quote;

/// Fetches live quotes for holding names from the registered providers.
///
/// Failure isolation: each name resolves to exactly one `QuoteOutcome`.
/// A failing name never aborts the others and nothing is propagated as an
/// error. Per name:
/// - quote providers are tried in registration order (fallback)
/// - each attempt is bounded by the fetch timeout
/// - transient failures retry with exponential backoff
/// - fundamentals are best-effort and never fail the quote
pub struct QuoteService {
    registry: QuoteProviderRegistry,
    settings: TrackerSettings,
}

impl QuoteService {
    pub fn new(registry: QuoteProviderRegistry, settings: TrackerSettings) -> Self {
        Self { registry, settings }
    }

    /// Names of all registered providers.
    pub fn provider_names(&self) -> Vec<String> {
        self.registry.provider_names()
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Fetch quotes for every name concurrently. The result has one entry
    /// per requested name, in request order.
    pub async fn fetch_quotes(&self, names: &[String]) -> Vec<QuoteOutcome> {
        let outcomes = join_all(names.iter().map(|name| self.fetch_quote(name))).await;

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            requested = names.len(),
            failed, "Fetched quotes for {} holdings", names.len()
        );
        outcomes
    }

    /// Fetch one holding's quote. Never fails; errors become `Failure`.
    pub async fn fetch_quote(&self, name: &str) -> QuoteOutcome {
        match self.fetch_market_quote(name).await {
            Ok(market) => {
                let fundamentals = self.fetch_fundamentals(&market).await;
                QuoteOutcome::Success {
                    name: name.to_string(),
                    quote: normalize_quote(name, &market, fundamentals.as_ref()),
                }
            }
            Err(e) => {
                warn!("Quote lookup failed for {name}: {e}");
                QuoteOutcome::Failure {
                    name: name.to_string(),
                    reason: failure_reason(name, &e),
                }
            }
        }
    }

    /// Try each quote provider in order, retrying transient failures.
    async fn fetch_market_quote(&self, name: &str) -> Result<MarketQuote, CoreError> {
        let providers = self.registry.quote_providers();
        if providers.is_empty() {
            return Err(CoreError::NoProvider);
        }

        let mut last_error = None;
        for provider in &providers {
            let result = with_retry(&self.settings.retry, name, || {
                self.with_timeout(provider.lookup(name))
            })
            .await;

            match result {
                Ok(quote) => {
                    // Validate the price is finite and non-negative
                    if !quote.current_price.is_finite() || quote.current_price < 0.0 {
                        last_error = Some(CoreError::Api {
                            provider: provider.name().to_string(),
                            message: format!(
                                "Invalid price returned for {name}: {} (must be finite and non-negative)",
                                quote.current_price
                            ),
                        });
                        continue;
                    }
                    return Ok(quote);
                }
                Err(e) => {
                    debug!("{} failed for {name}: {e}", provider.name());
                    last_error = Some(e);
                    // Try next provider
                }
            }
        }

        Err(last_error.unwrap_or(CoreError::NoProvider))
    }

    /// First fundamentals provider that answers wins; none answering is fine.
    async fn fetch_fundamentals(&self, market: &MarketQuote) -> Option<Fundamentals> {
        let exchange = market.exchange.as_deref().unwrap_or_default();
        for provider in self.registry.fundamentals_providers() {
            match self
                .with_timeout(provider.fundamentals(&market.symbol, exchange))
                .await
            {
                Ok(fundamentals) => return Some(fundamentals),
                Err(e) => debug!(
                    "{} fundamentals unavailable for {}: {e}",
                    provider.name(),
                    market.symbol
                ),
            }
        }
        None
    }

    async fn with_timeout<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        let limit = self.settings.fetch_timeout();
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::Timeout(limit.as_millis() as u64)),
        }
    }
}

/// Run `op`, retrying retryable errors per `policy` with exponential backoff.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, CoreError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                debug!(
                    "Retrying {label} in {} ms (attempt {} of {}): {e}",
                    delay.as_millis(),
                    attempt + 1,
                    policy.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Diagnostic string surfaced for a failed holding.
pub fn failure_reason(name: &str, error: &CoreError) -> String {
    match error {
        CoreError::RateLimited { .. } => {
            format!("Rate limit exceeded for {name}. Please try again later.")
        }
        CoreError::SymbolNotFound(_) => {
            format!("Stock symbol {name} not found or has no data.")
        }
        other => format!("Failed to fetch stock data for {name}: {other}"),
    }
}
