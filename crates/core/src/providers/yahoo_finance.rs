use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use urlencoding::encode;

use super::traits::QuoteProvider;
use crate::errors::CoreError;
use crate::models::quote::{MarketQuote, QuarterlyEarnings};

const PROVIDER: &str = "Yahoo Finance";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Exchange code Yahoo uses for the National Stock Exchange of India.
pub const PREFERRED_EXCHANGE: &str = "NSI";

/// Yahoo Finance provider for Indian (and global) equities.
///
/// - **Free**: No API key required.
/// - **Lookup**: searches the holding name, preferring an NSE listing,
///   then reads the `quoteSummary` endpoint (price, summaryDetail, earnings).
/// - **Auth**: `quoteSummary` needs a cookie + crumb pair. It is fetched
///   lazily, kept on this instance, and dropped on HTTP 401.
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
    client: Client,
    crumb: RwLock<Option<CrumbData>>,
}

#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

/// The parts of a search hit needed to pick a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCandidate {
    pub symbol: String,
    pub exchange: String,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to create connector: {e}"),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Ok(Self {
            connector,
            client,
            crumb: RwLock::new(None),
        })
    }

    /// Search Yahoo for a holding name and return the chosen listing.
    async fn search_symbol(&self, holding_name: &str) -> Result<SearchCandidate, CoreError> {
        let encoded = encode(holding_name);
        debug!("Searching {PROVIDER} for '{holding_name}'");

        let result = self
            .connector
            .search_ticker(&encoded)
            .await
            .map_err(|e| classify_error(holding_name, &e.to_string()))?;

        let candidates: Vec<SearchCandidate> = result
            .quotes
            .iter()
            .map(|item| SearchCandidate {
                symbol: item.symbol.clone(),
                exchange: item.exchange.clone(),
            })
            .collect();

        select_candidate(&candidates)
            .cloned()
            .ok_or_else(|| CoreError::SymbolNotFound(holding_name.to_string()))
    }

    async fn ensure_crumb(&self) -> Result<CrumbData, CoreError> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }
        self.fetch_crumb().await
    }

    async fn fetch_crumb(&self) -> Result<CrumbData, CoreError> {
        // Step 1: session cookie
        let response = self.client.get(COOKIE_URL).send().await?;
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split_once(';').map(|(v, _)| v.to_string()))
            .ok_or_else(|| CoreError::Api {
                provider: PROVIDER.into(),
                message: "Failed to parse Yahoo cookie".into(),
            })?;

        // Step 2: crumb bound to that cookie
        let crumb = self
            .client
            .get(CRUMB_URL)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::COOKIE, &cookie)
            .send()
            .await?
            .text()
            .await?;

        let crumb_data = CrumbData { cookie, crumb };
        *self.crumb.write().await = Some(crumb_data.clone());
        Ok(crumb_data)
    }

    async fn fetch_quote_summary(&self, symbol: &str) -> Result<MarketQuote, CoreError> {
        let crumb = self.ensure_crumb().await?;
        let url = format!(
            "{QUOTE_SUMMARY_URL}/{}?modules=earnings,price,summaryDetail&crumb={}",
            encode(symbol),
            encode(&crumb.crumb)
        );

        let response = self
            .client
            .get(&url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::COOKIE, &crumb.cookie)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                *self.crumb.write().await = None;
                return Err(CoreError::Api {
                    provider: PROVIDER.into(),
                    message: "Yahoo authentication expired".into(),
                });
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(CoreError::RateLimited {
                    provider: PROVIDER.into(),
                });
            }
            StatusCode::NOT_FOUND => return Err(CoreError::SymbolNotFound(symbol.to_string())),
            status if !status.is_success() => {
                return Err(CoreError::Api {
                    provider: PROVIDER.into(),
                    message: format!("HTTP {status} for {symbol}"),
                });
            }
            _ => {}
        }

        let body = response.text().await?;
        parse_quote_summary(symbol, &body)
    }
}

#[async_trait]
impl QuoteProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn lookup(&self, holding_name: &str) -> Result<MarketQuote, CoreError> {
        let candidate = self.search_symbol(holding_name).await?;
        debug!(
            "Resolved '{holding_name}' to {} on {}",
            candidate.symbol, candidate.exchange
        );
        self.fetch_quote_summary(&candidate.symbol).await
    }
}

// ── Pure helpers ────────────────────────────────────────────────────

/// Prefer the first NSE listing, otherwise the first hit.
pub fn select_candidate(candidates: &[SearchCandidate]) -> Option<&SearchCandidate> {
    candidates
        .iter()
        .find(|c| c.exchange == PREFERRED_EXCHANGE)
        .or_else(|| candidates.first())
}

/// Drop an exchange suffix: "HDFCBANK.NS" → "HDFCBANK".
pub fn strip_exchange_suffix(symbol: &str) -> &str {
    symbol.split_once('.').map_or(symbol, |(base, _)| base)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn classify_error(subject: &str, message: &str) -> CoreError {
    let lower = message.to_lowercase();
    if lower.contains("rate limit") || lower.contains("429") || lower.contains("too many requests")
    {
        CoreError::RateLimited {
            provider: PROVIDER.into(),
        }
    } else if lower.contains("not found") || lower.contains("no data") {
        CoreError::SymbolNotFound(subject.to_string())
    } else {
        CoreError::Api {
            provider: PROVIDER.into(),
            message: message.to_string(),
        }
    }
}

/// Parse a `quoteSummary` response body into a `MarketQuote`.
///
/// `requested` is the symbol that was asked for; it is used when the
/// payload omits its own symbol.
pub fn parse_quote_summary(requested: &str, body: &str) -> Result<MarketQuote, CoreError> {
    let response: QuoteSummaryResponse =
        serde_json::from_str(body).map_err(|e| CoreError::Parse {
            provider: PROVIDER.into(),
            message: format!("quoteSummary for {requested}: {e}"),
        })?;

    if let Some(error) = response.quote_summary.error {
        let message = error.description.unwrap_or_default();
        return Err(classify_error(requested, &format!("{} {message}", error.code)));
    }

    let result = response
        .quote_summary
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::SymbolNotFound(requested.to_string()))?;

    let price = result.price.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();

    let full_symbol = price.symbol.unwrap_or_else(|| requested.to_string());
    let symbol = strip_exchange_suffix(&full_symbol).to_string();
    let name = price
        .long_name
        .or(price.short_name)
        .or_else(|| Some(full_symbol.clone()));

    let pe_ratio = detail
        .trailing_pe
        .and_then(|v| v.raw)
        .or_else(|| detail.forward_pe.and_then(|v| v.raw))
        .unwrap_or(0.0);

    let quarterly_earnings = result
        .earnings
        .and_then(|e| e.financials_chart)
        .map(|chart| {
            chart
                .quarterly
                .into_iter()
                .map(|q| QuarterlyEarnings {
                    date: q.date,
                    earnings: q.earnings.and_then(|v| v.raw).unwrap_or(0.0),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(MarketQuote {
        symbol,
        name,
        exchange: price.exchange,
        current_price: price.regular_market_price.and_then(|v| v.raw).unwrap_or(0.0),
        pe_ratio: round2(pe_ratio),
        currency: price.currency.unwrap_or_else(|| "INR".to_string()),
        market_cap: price.market_cap.and_then(|v| v.raw).unwrap_or(0.0),
        volume: price.regular_market_volume.and_then(|v| v.raw).unwrap_or(0.0),
        quarterly_earnings,
    })
}

// ── quoteSummary response types ─────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<QuoteSummaryError>,
}

#[derive(Deserialize)]
struct QuoteSummaryError {
    code: String,
    description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetailModule>,
    earnings: Option<EarningsModule>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`, or `{}` when absent.
#[derive(Deserialize, Default)]
struct RawValue {
    raw: Option<f64>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    symbol: Option<String>,
    exchange: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    currency: Option<String>,
    regular_market_price: Option<RawValue>,
    market_cap: Option<RawValue>,
    regular_market_volume: Option<RawValue>,
}

#[derive(Deserialize, Default)]
struct SummaryDetailModule {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<RawValue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EarningsModule {
    financials_chart: Option<FinancialsChart>,
}

#[derive(Deserialize)]
struct FinancialsChart {
    #[serde(default)]
    quarterly: Vec<QuarterlyEntry>,
}

#[derive(Deserialize)]
struct QuarterlyEntry {
    date: String,
    earnings: Option<RawValue>,
}
