use super::google_finance::GoogleFinanceProvider;
use super::traits::{FundamentalsProvider, QuoteProvider};
use super::yahoo_finance::YahooFinanceProvider;

/// Registry of all available quote and fundamentals providers.
///
/// Providers are consulted in registration order; later ones are fallbacks.
pub struct QuoteProviderRegistry {
    quote_providers: Vec<Box<dyn QuoteProvider>>,
    fundamentals_providers: Vec<Box<dyn FundamentalsProvider>>,
}

impl QuoteProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            quote_providers: Vec::new(),
            fundamentals_providers: Vec::new(),
        }
    }

    /// Create a registry with all default providers pre-configured.
    pub fn new_with_defaults() -> Self {
        let mut registry = Self::new();

        // Yahoo Finance — name search + quote summary, no API key needed
        match YahooFinanceProvider::new() {
            Ok(yahoo) => registry.register_quote_provider(Box::new(yahoo)),
            Err(e) => tracing::warn!("Yahoo Finance provider unavailable: {e}"),
        }

        // Google Finance — P/E and EPS scraped from quote pages
        registry.register_fundamentals_provider(Box::new(GoogleFinanceProvider::new()));

        registry
    }

    /// Register a name-keyed quote provider.
    pub fn register_quote_provider(&mut self, provider: Box<dyn QuoteProvider>) {
        self.quote_providers.push(provider);
    }

    /// Register a symbol-keyed fundamentals provider.
    pub fn register_fundamentals_provider(&mut self, provider: Box<dyn FundamentalsProvider>) {
        self.fundamentals_providers.push(provider);
    }

    /// All quote providers, ordered by registration priority.
    pub fn quote_providers(&self) -> Vec<&dyn QuoteProvider> {
        self.quote_providers.iter().map(|p| p.as_ref()).collect()
    }

    /// All fundamentals providers, ordered by registration priority.
    pub fn fundamentals_providers(&self) -> Vec<&dyn FundamentalsProvider> {
        self.fundamentals_providers.iter().map(|p| p.as_ref()).collect()
    }

    /// Names of the registered quote providers (for diagnostics).
    pub fn provider_names(&self) -> Vec<String> {
        self.quote_providers
            .iter()
            .map(|p| p.name().to_string())
            .chain(self.fundamentals_providers.iter().map(|p| p.name().to_string()))
            .collect()
    }
}

impl Default for QuoteProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
