use serde::{Deserialize, Serialize};

use super::quote::LatestEarnings;

/// A tracked stock position. Loaded once at startup and never mutated.
///
/// `name` is the join key between a holding and its live quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    /// Unique identifier within the holding set
    pub id: String,

    /// Display name, also used to search the quote source (e.g., "HDFC Bank")
    pub name: String,

    /// Sector label used for grouping (compared case-sensitively)
    pub sector: String,

    /// Average purchase price per share
    pub purchase_price: f64,

    /// Number of shares held
    pub quantity: u32,
}

impl Holding {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        sector: impl Into<String>,
        purchase_price: f64,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sector: sector.into(),
            purchase_price,
            quantity,
        }
    }

    /// Amount originally invested: purchase price × quantity.
    pub fn investment(&self) -> f64 {
        self.purchase_price * f64::from(self.quantity)
    }
}

/// A holding merged with its live quote and the derived valuation figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedHolding {
    pub id: String,
    pub name: String,
    pub sector: String,
    pub purchase_price: f64,
    pub quantity: u32,

    /// Ticker symbol from the quote source, or the holding name if unresolved
    pub symbol: String,

    /// Exchange code (e.g., "NSI", "BSE"); "NSE" when unresolved
    pub exchange: String,

    /// Current market price (CMP); 0 when the quote failed
    pub current_price: f64,

    pub pe_ratio: f64,
    pub latest_earnings: LatestEarnings,

    pub investment: f64,
    pub present_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percentage: f64,

    /// Share of total present value across the whole holding set
    pub portfolio_percentage: f64,
}

/// Column used to order enriched holdings for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HoldingSortField {
    Name,
    PurchasePrice,
    Quantity,
    Investment,
    PortfolioPercentage,
    CurrentPrice,
    #[default]
    PresentValue,
    GainLoss,
    PeRatio,
    /// Compared by earnings amount
    LatestEarnings,
}

impl std::str::FromStr for HoldingSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "purchasePrice" => Ok(Self::PurchasePrice),
            "quantity" => Ok(Self::Quantity),
            "investment" => Ok(Self::Investment),
            "portfolioPercentage" => Ok(Self::PortfolioPercentage),
            "currentPrice" => Ok(Self::CurrentPrice),
            "presentValue" => Ok(Self::PresentValue),
            "gainLoss" => Ok(Self::GainLoss),
            "peRatio" => Ok(Self::PeRatio),
            "latestEarnings" => Ok(Self::LatestEarnings),
            other => Err(format!("Unknown sort field: {other}")),
        }
    }
}

/// Sort direction for holding listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("Unknown sort direction: {other}")),
        }
    }
}
