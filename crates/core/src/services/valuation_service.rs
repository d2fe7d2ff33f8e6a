use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::holding::{EnrichedHolding, Holding, HoldingSortField, SortDirection};
use crate::models::quote::{Quote, QuoteOutcome};
use crate::models::summary::{PortfolioSnapshot, PortfolioSummary, SectorSummary};

/// Merges static holdings with live quotes and rolls them up by sector.
///
/// Pure business logic: no I/O, no shared state. Every call builds a fresh
/// snapshot, so one instance can serve any number of concurrent requests.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Build a full snapshot from holdings and per-name quote outcomes.
    ///
    /// Every holding is present in the output. A missing or failed quote
    /// values that holding at zero instead of dropping it.
    pub fn aggregate(
        &self,
        holdings: &[Holding],
        quotes: &HashMap<String, QuoteOutcome>,
    ) -> PortfolioSnapshot {
        let now = Utc::now();

        // Pass 1: enrich without portfolio share
        let mut enriched: Vec<EnrichedHolding> = holdings
            .iter()
            .map(|holding| {
                let zero;
                let quote = match quotes.get(&holding.name).and_then(QuoteOutcome::quote) {
                    Some(quote) => quote,
                    None => {
                        zero = Quote::zero(&holding.name);
                        &zero
                    }
                };
                Self::enrich(holding, quote)
            })
            .collect();

        // Pass 2: portfolio share needs the grand total
        let total_present_value: f64 = enriched.iter().map(|h| h.present_value).sum();
        for holding in &mut enriched {
            holding.portfolio_percentage = if total_present_value == 0.0 {
                0.0
            } else {
                holding.present_value / total_present_value * 100.0
            };
        }

        let sector_summaries = self.sector_summaries(&enriched);
        let portfolio_summary = self.portfolio_summary(&enriched, now);

        PortfolioSnapshot {
            holdings: enriched,
            sector_summaries,
            portfolio_summary,
            last_updated: now,
        }
    }

    /// Snapshot with no live data: investment figures only, everything else zero.
    pub fn static_snapshot(&self, holdings: &[Holding]) -> PortfolioSnapshot {
        self.aggregate(holdings, &HashMap::new())
    }

    /// Group holdings by exact sector name, in order of first appearance.
    pub fn sector_summaries(&self, holdings: &[EnrichedHolding]) -> Vec<SectorSummary> {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<EnrichedHolding>> = HashMap::new();

        for holding in holdings {
            let sector = holding.sector.as_str();
            if !groups.contains_key(sector) {
                order.push(sector);
            }
            groups.entry(sector).or_default().push(holding.clone());
        }

        order
            .into_iter()
            .filter_map(|sector| {
                let members = groups.remove(sector)?;
                let (total_investment, total_present_value) = totals(&members);
                let total_gain_loss = total_present_value - total_investment;
                Some(SectorSummary {
                    name: sector.to_string(),
                    total_investment,
                    total_present_value,
                    total_gain_loss,
                    gain_loss_percentage: percentage_of(total_gain_loss, total_investment),
                    holdings: members,
                })
            })
            .collect()
    }

    /// Totals across the whole holding set.
    pub fn portfolio_summary(
        &self,
        holdings: &[EnrichedHolding],
        last_updated: DateTime<Utc>,
    ) -> PortfolioSummary {
        let (total_investment, total_present_value) = totals(holdings);
        let total_gain_loss = total_present_value - total_investment;
        PortfolioSummary {
            total_investment,
            total_present_value,
            total_gain_loss,
            gain_loss_percentage: percentage_of(total_gain_loss, total_investment),
            last_updated,
        }
    }

    /// Stable sort of holdings for display. Strings sort lexicographically,
    /// numbers numerically with NaN above every number.
    pub fn sort_holdings(
        &self,
        holdings: &mut [EnrichedHolding],
        field: HoldingSortField,
        direction: SortDirection,
    ) {
        holdings.sort_by(|a, b| {
            let ordering = compare_by(a, b, field);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    fn enrich(holding: &Holding, quote: &Quote) -> EnrichedHolding {
        let investment = holding.investment();
        let present_value = quote.current_price * f64::from(holding.quantity);
        let gain_loss = present_value - investment;

        EnrichedHolding {
            id: holding.id.clone(),
            name: holding.name.clone(),
            sector: holding.sector.clone(),
            purchase_price: holding.purchase_price,
            quantity: holding.quantity,
            symbol: quote.symbol.clone(),
            exchange: quote.exchange.clone(),
            current_price: quote.current_price,
            pe_ratio: quote.pe_ratio,
            latest_earnings: quote.latest_earnings.clone(),
            investment,
            present_value,
            gain_loss,
            gain_loss_percentage: percentage_of(gain_loss, investment),
            portfolio_percentage: 0.0, // filled in the second pass
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}

/// Index quote outcomes by holding name. A later outcome for the same
/// name replaces an earlier one.
pub fn quotes_by_name(outcomes: Vec<QuoteOutcome>) -> HashMap<String, QuoteOutcome> {
    outcomes
        .into_iter()
        .map(|outcome| (outcome.name().to_string(), outcome))
        .collect()
}

fn totals(holdings: &[EnrichedHolding]) -> (f64, f64) {
    holdings.iter().fold((0.0, 0.0), |(inv, pv), h| {
        (inv + h.investment, pv + h.present_value)
    })
}

fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

fn compare_by(a: &EnrichedHolding, b: &EnrichedHolding, field: HoldingSortField) -> Ordering {
    let num = |x: f64, y: f64| x.total_cmp(&y);
    match field {
        HoldingSortField::Name => a.name.cmp(&b.name),
        HoldingSortField::PurchasePrice => num(a.purchase_price, b.purchase_price),
        HoldingSortField::Quantity => a.quantity.cmp(&b.quantity),
        HoldingSortField::Investment => num(a.investment, b.investment),
        HoldingSortField::PortfolioPercentage => {
            num(a.portfolio_percentage, b.portfolio_percentage)
        }
        HoldingSortField::CurrentPrice => num(a.current_price, b.current_price),
        HoldingSortField::PresentValue => num(a.present_value, b.present_value),
        HoldingSortField::GainLoss => num(a.gain_loss, b.gain_loss),
        HoldingSortField::PeRatio => num(a.pe_ratio, b.pe_ratio),
        HoldingSortField::LatestEarnings => {
            num(a.latest_earnings.amount, b.latest_earnings.amount)
        }
    }
}
