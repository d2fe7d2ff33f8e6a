use async_trait::async_trait;
use regex::Regex;
use reqwest::{header, Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::debug;
use urlencoding::encode;

use super::traits::FundamentalsProvider;
use crate::errors::CoreError;
use crate::models::quote::Fundamentals;

const PROVIDER: &str = "Google Finance";
const BASE_URL: &str = "https://www.google.com/finance/quote";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/115.0 Safari/537.36";

/// Google Finance quote-page scraper for P/E ratio and EPS.
///
/// There is no public API, so values are read from the page markup by
/// CSS class. The class names change whenever Google ships a new frontend,
/// which is why all parsing lives in [`parse_fundamentals_html`] and every
/// field is optional.
pub struct GoogleFinanceProvider {
    client: Client,
}

impl GoogleFinanceProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

impl Default for GoogleFinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FundamentalsProvider for GoogleFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fundamentals(&self, symbol: &str, exchange: &str) -> Result<Fundamentals, CoreError> {
        if symbol.trim().is_empty() {
            return Err(CoreError::SymbolNotFound(symbol.to_string()));
        }
        let exchange = google_exchange_code(exchange);
        let url = format!("{BASE_URL}/{}:{}", encode(symbol), encode(exchange));

        let response = self
            .client
            .get(&url)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(CoreError::RateLimited {
                    provider: PROVIDER.into(),
                })
            }
            StatusCode::NOT_FOUND => {
                return Err(CoreError::SymbolNotFound(format!("{symbol}:{exchange}")))
            }
            status if !status.is_success() => {
                return Err(CoreError::Api {
                    provider: PROVIDER.into(),
                    message: format!("HTTP {status} for {symbol}:{exchange}"),
                })
            }
            _ => {}
        }

        let html = response.text().await?;
        let fundamentals = parse_fundamentals_html(&html, symbol, exchange)?;
        if fundamentals.eps_period.is_none() {
            debug!("EPS period not found for {symbol}:{exchange}");
        }
        Ok(fundamentals)
    }
}

/// Map a Yahoo exchange code to the one Google uses in quote URLs.
pub fn google_exchange_code(exchange: &str) -> &str {
    match exchange {
        "NSI" | "" => "NSE",
        other => other,
    }
}

fn selector(css: &str) -> Result<Selector, CoreError> {
    Selector::parse(css).map_err(|e| CoreError::Parse {
        provider: PROVIDER.into(),
        message: format!("invalid selector '{css}': {e:?}"),
    })
}

fn regex(pattern: &str) -> Result<Regex, CoreError> {
    Regex::new(pattern).map_err(|e| CoreError::Parse {
        provider: PROVIDER.into(),
        message: format!("invalid pattern '{pattern}': {e}"),
    })
}

fn trimmed_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Extract P/E, EPS and the EPS reporting period from a quote page.
pub fn parse_fundamentals_html(
    html: &str,
    symbol: &str,
    exchange: &str,
) -> Result<Fundamentals, CoreError> {
    let document = Html::parse_document(html);

    Ok(Fundamentals {
        symbol: symbol.to_string(),
        exchange: exchange.to_string(),
        pe_ratio: find_pe_ratio(&document)?,
        eps: find_eps(&document)?,
        eps_period: find_eps_period(&document)?,
    })
}

/// `<span><div class="mfs7Fc">P/E ratio</div></span><div class="P6K39c">23.4</div>`
fn find_pe_ratio(document: &Html) -> Result<Option<String>, CoreError> {
    let label = selector("div.mfs7Fc")?;
    let value = selector("div.P6K39c")?;

    let Some(label_div) = document
        .select(&label)
        .find(|el| trimmed_text(el) == "P/E ratio")
    else {
        return Ok(None);
    };

    let Some(span) = label_div
        .parent()
        .and_then(ElementRef::wrap)
        .filter(|p| p.value().name() == "span")
    else {
        return Ok(None);
    };

    Ok(span
        .next_siblings()
        .find_map(ElementRef::wrap)
        .filter(|next| value.matches(next))
        .map(|div| trimmed_text(&div)))
}

/// First financials row labelled "Earnings per share".
fn find_eps(document: &Html) -> Result<Option<String>, CoreError> {
    let row = selector("tr.roXhBd")?;
    let label = selector("div.rsPbEe")?;
    let cell = selector("td.QXDnM")?;

    let eps_row = document.select(&row).find(|tr| {
        let text: String = tr.select(&label).flat_map(|el| el.text()).collect();
        text.trim() == "Earnings per share"
    });

    Ok(eps_row
        .map(|tr| {
            tr.select(&cell)
                .flat_map(|el| el.text())
                .collect::<String>()
                .trim()
                .to_string()
        })
        .filter(|eps| !eps.is_empty()))
}

/// Period of the financials table, e.g. "Mar 2025".
///
/// Tried in order: the table's period header cells, any short element
/// that reads like "Month YYYY", then any header cell mentioning a year.
fn find_eps_period(document: &Html) -> Result<Option<String>, CoreError> {
    let month_year = regex(r"^[A-Za-z]+\s+\d{4}$")?;
    let headers = selector("th.yNnsfe")?;
    if let Some(period) = document
        .select(&headers)
        .map(|el| trimmed_text(&el))
        .find(|text| month_year.is_match(text))
    {
        return Ok(Some(period));
    }

    let short_month_year = regex(r"^[A-Za-z]{3,}\s+\d{4}$")?;
    let any = selector("*")?;
    if let Some(period) = document
        .select(&any)
        .map(|el| trimmed_text(&el))
        .find(|text| text.len() < 20 && short_month_year.is_match(text))
    {
        return Ok(Some(period));
    }

    let year = regex(r"\b20\d{2}\b")?;
    let embedded = regex(r"([A-Za-z]{3,}\s+\d{4})")?;
    let th = selector("th")?;
    Ok(document.select(&th).find_map(|el| {
        let text = trimmed_text(&el);
        if !year.is_match(&text) {
            return None;
        }
        embedded
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }))
}
