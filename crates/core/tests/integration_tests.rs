// ═══════════════════════════════════════════════════════════════════
// Integration Tests — holdings loading, PortfolioTracker facade,
// display formatting
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use portfolio_tracker_core::data::{
    default_holdings, load_holdings_from_file, parse_holdings_json, validate_holdings,
};
use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::format::{format_currency, format_currency_words, format_percentage};
use portfolio_tracker_core::models::holding::{Holding, HoldingSortField, SortDirection};
use portfolio_tracker_core::models::quote::MarketQuote;
use portfolio_tracker_core::models::settings::{RetryPolicy, TrackerSettings};
use portfolio_tracker_core::providers::registry::QuoteProviderRegistry;
use portfolio_tracker_core::providers::traits::QuoteProvider;
use portfolio_tracker_core::PortfolioTracker;

// ═══════════════════════════════════════════════════════════════════
// Mock Provider
// ═══════════════════════════════════════════════════════════════════

/// Prices every holding at one fixed price; names containing "Fail" are not found.
struct FixedPriceProvider {
    price: f64,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl QuoteProvider for FixedPriceProvider {
    fn name(&self) -> &str {
        "FixedPrice"
    }

    async fn lookup(&self, holding_name: &str) -> Result<MarketQuote, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if holding_name.contains("Fail") {
            return Err(CoreError::SymbolNotFound(holding_name.to_string()));
        }
        Ok(MarketQuote {
            symbol: holding_name.to_uppercase(),
            name: Some(holding_name.to_string()),
            exchange: Some("NSI".into()),
            current_price: self.price,
            pe_ratio: 12.0,
            currency: "INR".into(),
            market_cap: 0.0,
            volume: 0.0,
            quarterly_earnings: vec![],
        })
    }
}

fn settings() -> TrackerSettings {
    TrackerSettings {
        fetch_timeout_ms: 500,
        retry: RetryPolicy::none(),
        stale_after_secs: 60,
        refresh_interval_secs: 15,
    }
}

fn tracker(holdings: Vec<Holding>, price: f64) -> (PortfolioTracker, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = QuoteProviderRegistry::new();
    registry.register_quote_provider(Box::new(FixedPriceProvider {
        price,
        calls: Arc::clone(&calls),
    }));
    (PortfolioTracker::new(holdings, registry, settings()), calls)
}

fn sample() -> Vec<Holding> {
    vec![
        Holding::new("1", "Alpha", "Tech", 100.0, 10),
        Holding::new("2", "FailCo", "Tech", 50.0, 10),
        Holding::new("3", "Gamma", "Power", 20.0, 5),
    ]
}

// ═══════════════════════════════════════════════════════════════════
// Holdings data
// ═══════════════════════════════════════════════════════════════════

mod holdings_data {
    use super::*;

    #[test]
    fn default_set_is_complete_and_valid() {
        let holdings = default_holdings();
        assert_eq!(holdings.len(), 26);
        assert!(validate_holdings(&holdings).is_ok());
        assert_eq!(holdings[0].name, "HDFC Bank");
        assert_eq!(holdings[0].investment(), 74_500.0);
    }

    #[test]
    fn default_sectors_in_order() {
        let (tracker, _) = tracker(default_holdings(), 1.0);
        assert_eq!(
            tracker.sectors(),
            vec![
                "Financial Services",
                "Technology",
                "Consumer Goods",
                "Power",
                "Pipe",
                "Others"
            ]
        );
    }

    #[test]
    fn parses_valid_json() {
        let json = r#"[
            {"id": "a", "name": "Alpha", "sector": "Tech", "purchasePrice": 10.5, "quantity": 3}
        ]"#;
        let holdings = parse_holdings_json(json).unwrap();
        assert_eq!(holdings, vec![Holding::new("a", "Alpha", "Tech", 10.5, 3)]);
    }

    #[test]
    fn malformed_json_is_deserialization_error() {
        let err = parse_holdings_json(r#"[{"id": "a"}]"#).unwrap_err();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let holdings = vec![
            Holding::new("1", "A", "Tech", 1.0, 1),
            Holding::new("1", "B", "Tech", 1.0, 1),
        ];
        let err = validate_holdings(&holdings).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Holding validation failed: Duplicate holding id: 1"
        );
    }

    #[test]
    fn rejects_blank_fields() {
        let blank_id = [Holding::new(" ", "A", "Tech", 1.0, 1)];
        let blank_name = [Holding::new("1", "", "Tech", 1.0, 1)];
        let blank_sector = [Holding::new("1", "A", "  ", 1.0, 1)];

        assert!(matches!(validate_holdings(&blank_id), Err(CoreError::Validation(ref m)) if m.contains("empty id")));
        assert!(matches!(validate_holdings(&blank_name), Err(CoreError::Validation(ref m)) if m.contains("empty name")));
        assert!(matches!(validate_holdings(&blank_sector), Err(CoreError::Validation(ref m)) if m.contains("empty sector")));
    }

    #[test]
    fn rejects_bad_purchase_price() {
        for price in [-1.0, f64::NAN, f64::INFINITY] {
            let holdings = [Holding::new("1", "A", "Tech", price, 1)];
            assert!(matches!(
                validate_holdings(&holdings),
                Err(CoreError::Validation(_))
            ));
        }
        assert!(validate_holdings(&[Holding::new("1", "A", "Tech", 0.0, 0)]).is_ok());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "x", "name": "X Ltd", "sector": "Pipe", "purchasePrice": 12.0, "quantity": 100}}]"#
        )
        .unwrap();

        let holdings = load_holdings_from_file(file.path()).unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].investment(), 1200.0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_holdings_from_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CoreError::FileIO(_)));
    }

    #[test]
    fn tracker_from_invalid_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "1", "name": "A", "sector": "T", "purchasePrice": 1, "quantity": 1}},
               {{"id": "1", "name": "B", "sector": "T", "purchasePrice": 1, "quantity": 1}}]"#
        )
        .unwrap();

        let result = PortfolioTracker::from_holdings_file(file.path(), settings());
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }
}

// ═══════════════════════════════════════════════════════════════════
// PortfolioTracker facade
// ═══════════════════════════════════════════════════════════════════

mod tracker_facade {
    use super::*;

    #[test]
    fn exposes_holdings() {
        let (tracker, _) = tracker(sample(), 1.0);
        assert_eq!(tracker.holdings().len(), 3);
        assert_eq!(tracker.holding_names(), vec!["Alpha", "FailCo", "Gamma"]);
        assert_eq!(tracker.sectors(), vec!["Tech", "Power"]);
        assert_eq!(tracker.provider_names(), vec!["FixedPrice"]);
        assert_eq!(tracker.settings(), &settings());
    }

    #[test]
    fn static_snapshot_makes_no_calls() {
        let (tracker, calls) = tracker(sample(), 1.0);
        let snapshot = tracker.static_snapshot();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(snapshot.portfolio_summary.total_investment, 1600.0);
        assert_eq!(snapshot.portfolio_summary.total_present_value, 0.0);
        assert_eq!(snapshot.portfolio_summary.gain_loss_percentage, -100.0);
    }

    #[tokio::test]
    async fn live_snapshot_values_requested_names() {
        let (tracker, calls) = tracker(sample(), 200.0);
        let snapshot = tracker.live_snapshot(&["Alpha".to_string()]).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(snapshot.holdings.len(), 3);
        assert_eq!(snapshot.holdings[0].present_value, 2000.0);
        assert_eq!(snapshot.holdings[2].present_value, 0.0);
    }

    #[tokio::test]
    async fn live_snapshot_always_fetches() {
        let (tracker, calls) = tracker(sample(), 200.0);
        let request = vec!["Alpha".to_string()];
        tracker.live_snapshot(&request).await;
        tracker.live_snapshot(&request).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn full_snapshot_is_cached() {
        let (tracker, calls) = tracker(sample(), 200.0);
        let first = tracker.full_snapshot().await;
        let second = tracker.full_snapshot().await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(Arc::ptr_eq(&first, &second));
        // Alpha 2000 + FailCo 0 + Gamma 1000
        assert_eq!(first.portfolio_summary.total_present_value, 3000.0);
    }

    #[tokio::test]
    async fn refresh_now_and_invalidate() {
        let (tracker, calls) = tracker(sample(), 200.0);
        tracker.full_snapshot().await;
        tracker.refresh_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 6);

        tracker.invalidate_cache();
        tracker.full_snapshot().await;
        assert_eq!(calls.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn cached_snapshot_keys_by_requested_names() {
        let (tracker, calls) = tracker(sample(), 200.0);
        tracker
            .cached_snapshot(&["Gamma".to_string(), "Alpha".to_string()])
            .await;
        tracker
            .cached_snapshot(&["Alpha".to_string(), "Gamma".to_string()])
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fetch_quotes_reports_failures() {
        let (tracker, _) = tracker(sample(), 200.0);
        let outcomes = tracker.fetch_quotes(&tracker.holding_names()).await;
        let failed: Vec<&str> = outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.name())
            .collect();
        assert_eq!(failed, vec!["FailCo"]);
    }

    #[tokio::test]
    async fn sorts_snapshot_holdings() {
        let (tracker, _) = tracker(sample(), 200.0);
        let mut snapshot = tracker.live_snapshot(&tracker.holding_names()).await;
        tracker.sort_holdings(
            &mut snapshot.holdings,
            HoldingSortField::GainLoss,
            SortDirection::Desc,
        );
        let order: Vec<&str> = snapshot.holdings.iter().map(|h| h.name.as_str()).collect();
        // Alpha +1000, Gamma +900, FailCo -500
        assert_eq!(order, vec!["Alpha", "Gamma", "FailCo"]);
    }

    #[tokio::test]
    async fn scheduler_starts_and_stops() {
        let (tracker, calls) = tracker(sample(), 200.0);
        let handle = tracker.start_scheduler();

        let waited = tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while calls.load(Ordering::SeqCst) < 3 {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(waited.is_ok());
        handle.shutdown().await;
    }

    #[test]
    fn debug_summarizes_state() {
        let (tracker, _) = tracker(sample(), 1.0);
        let debug = format!("{tracker:?}");
        assert!(debug.contains("PortfolioTracker"));
        assert!(debug.contains("FixedPrice"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Display formatting
// ═══════════════════════════════════════════════════════════════════

mod formatting {
    use super::*;

    #[test]
    fn currency_uses_indian_grouping() {
        assert_eq!(format_currency(0.0), "₹0");
        assert_eq!(format_currency(999.0), "₹999");
        assert_eq!(format_currency(1_000.0), "₹1,000");
        assert_eq!(format_currency(74_500.0), "₹74,500");
        assert_eq!(format_currency(1_234_567.0), "₹12,34,567");
        assert_eq!(format_currency(123_456_789.0), "₹12,34,56,789");
    }

    #[test]
    fn currency_rounds_and_signs() {
        assert_eq!(format_currency(1_499.6), "₹1,500");
        assert_eq!(format_currency(-1_500.0), "-₹1,500");
        assert_eq!(format_currency(-0.2), "₹0");
    }

    #[test]
    fn currency_words() {
        assert_eq!(format_currency_words(15_000_000.0), "₹1.50 cr");
        assert_eq!(format_currency_words(-235_000.0), "-₹2.35 lakh");
        assert_eq!(format_currency_words(74_500.0), "₹74.50 th");
        assert_eq!(format_currency_words(500.0), "₹500");
    }

    #[test]
    fn percentages() {
        assert_eq!(format_percentage(12.346), "+12.35%");
        assert_eq!(format_percentage(0.0), "+0.00%");
        assert_eq!(format_percentage(-5.0), "-5.00%");
    }
}
