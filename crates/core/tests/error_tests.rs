// ═══════════════════════════════════════════════════════════════════
// Error Tests — CoreError variants, Display formatting, From impls,
// retry classification
// ═══════════════════════════════════════════════════════════════════

use portfolio_tracker_core::errors::CoreError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn api() {
        let err = CoreError::Api {
            provider: "Yahoo Finance".into(),
            message: "HTTP 500".into(),
        };
        assert_eq!(err.to_string(), "API error (Yahoo Finance): HTTP 500");
    }

    #[test]
    fn network() {
        let err = CoreError::Network("connection refused".into());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn timeout() {
        assert_eq!(
            CoreError::Timeout(10_000).to_string(),
            "Request timed out after 10000 ms"
        );
    }

    #[test]
    fn rate_limited() {
        let err = CoreError::RateLimited {
            provider: "Google Finance".into(),
        };
        assert_eq!(err.to_string(), "Rate limit exceeded (Google Finance)");
    }

    #[test]
    fn symbol_not_found() {
        let err = CoreError::SymbolNotFound("NOPE".into());
        assert_eq!(err.to_string(), "Symbol not found: NOPE");
    }

    #[test]
    fn parse() {
        let err = CoreError::Parse {
            provider: "Yahoo Finance".into(),
            message: "unexpected token".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse Yahoo Finance response: unexpected token"
        );
    }

    #[test]
    fn no_provider() {
        assert_eq!(CoreError::NoProvider.to_string(), "No quote provider registered");
    }

    #[test]
    fn validation() {
        let err = CoreError::Validation("Duplicate holding id: 7".into());
        assert_eq!(
            err.to_string(),
            "Holding validation failed: Duplicate holding id: 7"
        );
    }

    #[test]
    fn file_io() {
        let err = CoreError::FileIO("permission denied".into());
        assert_eq!(err.to_string(), "File I/O error: permission denied");
    }

    #[test]
    fn deserialization() {
        let err = CoreError::Deserialization("missing field `id`".into());
        assert_eq!(err.to_string(), "Deserialization error: missing field `id`");
    }
}

// ── Retry classification ────────────────────────────────────────────

mod retryable {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(CoreError::Api {
            provider: "p".into(),
            message: "m".into()
        }
        .is_retryable());
        assert!(CoreError::Network("reset".into()).is_retryable());
        assert!(CoreError::Timeout(1).is_retryable());
        assert!(CoreError::RateLimited {
            provider: "p".into()
        }
        .is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(!CoreError::SymbolNotFound("X".into()).is_retryable());
        assert!(!CoreError::Parse {
            provider: "p".into(),
            message: "m".into()
        }
        .is_retryable());
        assert!(!CoreError::NoProvider.is_retryable());
        assert!(!CoreError::Validation("v".into()).is_retryable());
        assert!(!CoreError::FileIO("f".into()).is_retryable());
        assert!(!CoreError::Deserialization("d".into()).is_retryable());
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod from_impls {
    use super::*;

    #[test]
    fn from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "holdings.json missing");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::FileIO(ref msg) if msg.contains("holdings.json missing")));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[test]
    fn question_mark_converts_io_error() {
        fn read() -> Result<String, CoreError> {
            Ok(std::fs::read_to_string("/definitely/not/a/real/path.json")?)
        }
        assert!(matches!(read(), Err(CoreError::FileIO(_))));
    }

    #[tokio::test]
    async fn from_reqwest_error_redacts_query() {
        // Nothing listens on port 1, so the request fails to connect.
        let reqwest_err = reqwest::Client::new()
            .get("http://127.0.0.1:1/v10/finance/quoteSummary/X?crumb=secret123")
            .send()
            .await
            .unwrap_err();
        let err: CoreError = reqwest_err.into();

        match err {
            CoreError::Network(msg) => {
                assert!(!msg.contains("secret123"), "crumb leaked: {msg}");
            }
            other => panic!("expected Network, got {other:?}"),
        }
    }
}

// ── std::error::Error ───────────────────────────────────────────────

mod std_error {
    use super::*;

    #[test]
    fn is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<CoreError>();
    }

    #[test]
    fn boxes_into_dyn_error() {
        let boxed: Box<dyn std::error::Error> = Box::new(CoreError::NoProvider);
        assert_eq!(boxed.to_string(), "No quote provider registered");
    }
}
