use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::quote::{Fundamentals, MarketQuote};

/// Trait abstraction for name-keyed market data sources.
///
/// Given the display name of a holding (e.g., "HDFC Bank"), a provider
/// resolves it to a listed symbol and returns its current market data.
/// Swapping a source touches only its implementation; the valuation code
/// only ever sees the normalized `Quote`.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Resolve a holding name and fetch its latest market data.
    async fn lookup(&self, holding_name: &str) -> Result<MarketQuote, CoreError>;
}

/// Trait abstraction for symbol-keyed fundamentals sources (P/E, EPS).
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch fundamentals for a listed symbol on an exchange.
    async fn fundamentals(&self, symbol: &str, exchange: &str) -> Result<Fundamentals, CoreError>;
}
