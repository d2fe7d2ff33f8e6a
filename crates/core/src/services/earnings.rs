use std::cmp::Reverse;

use crate::models::quote::{
    EarningsType, Fundamentals, LatestEarnings, MarketQuote, QuarterlyEarnings, Quote,
    DEFAULT_EXCHANGE,
};

/// Parse a quarter label of the form `<q>Q<yyyy>` into `(year, quarter)`.
///
/// Returns `None` for anything else ("Q1 2024", "10Q2024", "2024").
pub fn parse_quarter_label(label: &str) -> Option<(u32, u32)> {
    let (quarter, year) = label.split_once('Q')?;
    if quarter.len() != 1 || year.len() != 4 {
        return None;
    }
    if !quarter.chars().chain(year.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((year.parse().ok()?, quarter.parse().ok()?))
}

/// The most recent quarter by (year, quarter). Unparseable labels rank
/// lowest; on ties the earliest entry wins.
pub fn latest_quarter(quarterly: &[QuarterlyEarnings]) -> Option<&QuarterlyEarnings> {
    // min_by_key keeps the first of equal keys, so rank by Reverse.
    quarterly
        .iter()
        .min_by_key(|q| Reverse(parse_quarter_label(&q.date).unwrap_or((0, 0))))
}

/// Pick the earnings figure to show for a holding.
///
/// Precedence:
/// 1. per-share EPS from the fundamentals source, when it is a number
/// 2. the latest quarterly total from the quote source
/// 3. nothing (amount 0, no period, no type)
pub fn select_latest_earnings(
    fundamentals: Option<&Fundamentals>,
    quarterly: &[QuarterlyEarnings],
) -> LatestEarnings {
    if let Some(f) = fundamentals {
        if let Some(eps) = f.eps_value() {
            return LatestEarnings {
                period: f.eps_period.clone(),
                amount: eps,
                earnings_type: Some(EarningsType::PerShare),
            };
        }
    }

    match latest_quarter(quarterly) {
        Some(q) => LatestEarnings {
            period: Some(q.date.clone()),
            amount: q.earnings,
            earnings_type: Some(EarningsType::Total),
        },
        None => LatestEarnings::default(),
    }
}

/// Merge primary market data and optional fundamentals into a `Quote`.
///
/// Blank symbols/exchanges fall back to the holding name and "NSE".
pub fn normalize_quote(
    holding_name: &str,
    market: &MarketQuote,
    fundamentals: Option<&Fundamentals>,
) -> Quote {
    let symbol = if market.symbol.trim().is_empty() {
        holding_name.to_string()
    } else {
        market.symbol.clone()
    };
    let exchange = market
        .exchange
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or(DEFAULT_EXCHANGE)
        .to_string();

    Quote {
        symbol,
        exchange,
        current_price: non_negative(market.current_price),
        pe_ratio: non_negative(market.pe_ratio),
        latest_earnings: select_latest_earnings(fundamentals, &market.quarterly_earnings),
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
