use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::holding::EnrichedHolding;

/// Aggregate figures for all holdings sharing a sector label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorSummary {
    pub name: String,
    pub total_investment: f64,
    pub total_present_value: f64,
    /// total_present_value - total_investment
    pub total_gain_loss: f64,
    /// (total_gain_loss / total_investment) * 100, or 0 with no investment
    pub gain_loss_percentage: f64,
    pub holdings: Vec<EnrichedHolding>,
}

/// Whole-portfolio totals at the time of aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_investment: f64,
    pub total_present_value: f64,
    pub total_gain_loss: f64,
    pub gain_loss_percentage: f64,
    pub last_updated: DateTime<Utc>,
}

/// Everything one aggregation pass produces: the `data` payload of the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub holdings: Vec<EnrichedHolding>,
    pub sector_summaries: Vec<SectorSummary>,
    pub portfolio_summary: PortfolioSummary,
    pub last_updated: DateTime<Utc>,
}
