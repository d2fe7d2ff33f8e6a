use serde::{Deserialize, Serialize};

/// Exchange reported for holdings whose quote could not be resolved.
pub const DEFAULT_EXCHANGE: &str = "NSE";

/// How an earnings figure should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarningsType {
    /// Earnings per share (EPS) for the reported period
    #[serde(rename = "per-share")]
    PerShare,
    /// Total company earnings for a quarter
    #[serde(rename = "total")]
    Total,
}

/// The single earnings figure shown for a holding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestEarnings {
    /// Reporting period label (e.g., "Mar 2025" or "2Q2024")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,

    pub amount: f64,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub earnings_type: Option<EarningsType>,
}

/// One quarterly total-earnings entry as reported by the primary quote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyEarnings {
    /// Quarter label in `<q>Q<yyyy>` form, e.g. "2Q2024"
    pub date: String,
    pub earnings: f64,
}

impl QuarterlyEarnings {
    pub fn new(date: impl Into<String>, earnings: f64) -> Self {
        Self {
            date: date.into(),
            earnings,
        }
    }
}

/// Raw market data from a name-keyed quote provider, before earnings selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketQuote {
    /// Ticker without exchange suffix (e.g., "HDFCBANK" rather than "HDFCBANK.NS")
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub current_price: f64,
    pub pe_ratio: f64,
    pub currency: String,
    pub market_cap: f64,
    pub volume: f64,
    #[serde(default)]
    pub quarterly_earnings: Vec<QuarterlyEarnings>,
}

/// Data scraped from a symbol-keyed fundamentals source.
///
/// Values are kept as the source renders them; callers parse what they need.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fundamentals {
    pub symbol: String,
    pub exchange: String,
    pub pe_ratio: Option<String>,
    pub eps: Option<String>,
    pub eps_period: Option<String>,
}

impl Fundamentals {
    /// EPS parsed as a number, if present and numeric (thousands separators allowed).
    pub fn eps_value(&self) -> Option<f64> {
        let raw = self.eps.as_deref()?.trim().replace(',', "");
        raw.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// Normalized live quote for one holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub exchange: String,
    pub current_price: f64,
    pub pe_ratio: f64,
    pub latest_earnings: LatestEarnings,
}

impl Quote {
    /// The quote used for holdings whose lookup failed or was never requested.
    pub fn zero(name: &str) -> Self {
        Self {
            symbol: name.to_string(),
            exchange: DEFAULT_EXCHANGE.to_string(),
            current_price: 0.0,
            pe_ratio: 0.0,
            latest_earnings: LatestEarnings::default(),
        }
    }
}

/// Result of fetching one holding's quote. Exactly one per requested name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum QuoteOutcome {
    Success { name: String, quote: Quote },
    Failure { name: String, reason: String },
}

impl QuoteOutcome {
    /// The holding name this outcome belongs to.
    pub fn name(&self) -> &str {
        match self {
            QuoteOutcome::Success { name, .. } | QuoteOutcome::Failure { name, .. } => name,
        }
    }

    pub fn quote(&self) -> Option<&Quote> {
        match self {
            QuoteOutcome::Success { quote, .. } => Some(quote),
            QuoteOutcome::Failure { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QuoteOutcome::Success { .. })
    }
}
