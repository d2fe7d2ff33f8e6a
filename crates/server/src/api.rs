use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use portfolio_tracker_core::{
    format::{format_currency_words, format_percentage},
    models::{
        holding::{HoldingSortField, SortDirection},
        summary::PortfolioSnapshot,
    },
    PortfolioTracker,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models::{ApiResponse, DynamicQuery, SnapshotResponse, SortQuery},
};

pub async fn healthz() -> &'static str {
    "ok"
}

/// Investment-only view; never calls a quote provider.
async fn static_portfolio(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SortQuery>,
) -> ApiResult<Json<SnapshotResponse>> {
    let sort = query.parse()?;
    let mut snapshot = state.tracker.static_snapshot();
    apply_sort(&state.tracker, &mut snapshot, sort);
    Ok(Json(ApiResponse::ok(snapshot)))
}

/// Live quotes for the listed names, valued over the full holding set.
async fn dynamic_portfolio(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DynamicQuery>,
) -> ApiResult<Json<SnapshotResponse>> {
    let names = query.stock_names()?;
    let sort = query.sort.parse()?;

    let tracker = Arc::clone(&state.tracker);
    let snapshot = run_detached(async move { tracker.cached_snapshot(&names).await }).await?;
    Ok(Json(respond(&state.tracker, &snapshot, sort)))
}

/// Live quotes for every holding.
async fn full_portfolio(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SortQuery>,
) -> ApiResult<Json<SnapshotResponse>> {
    let sort = query.parse()?;

    let tracker = Arc::clone(&state.tracker);
    let snapshot = run_detached(async move { tracker.full_snapshot().await }).await?;
    Ok(Json(respond(&state.tracker, &snapshot, sort)))
}

/// Manual refresh; supersedes a scheduled refresh in progress.
async fn refresh_portfolio(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SortQuery>,
) -> ApiResult<Json<SnapshotResponse>> {
    let sort = query.parse()?;

    let tracker = Arc::clone(&state.tracker);
    let snapshot = run_detached(async move { tracker.refresh_now().await }).await?;
    Ok(Json(respond(&state.tracker, &snapshot, sort)))
}

/// Refreshes run on their own task so a dropped request cannot abandon one
/// midway while other callers wait on the refresh lock.
async fn run_detached<F>(fut: F) -> ApiResult<Arc<PortfolioSnapshot>>
where
    F: std::future::Future<Output = Arc<PortfolioSnapshot>> + Send + 'static,
{
    tokio::spawn(fut)
        .await
        .map_err(|e| ApiError::Internal(format!("Refresh task failed: {e}")))
}

fn respond(
    tracker: &PortfolioTracker,
    snapshot: &PortfolioSnapshot,
    sort: Option<(HoldingSortField, SortDirection)>,
) -> SnapshotResponse {
    let summary = &snapshot.portfolio_summary;
    tracing::info!(
        "Portfolio value {} ({} on {})",
        format_currency_words(summary.total_present_value),
        format_percentage(summary.gain_loss_percentage),
        format_currency_words(summary.total_investment),
    );

    let mut snapshot = snapshot.clone();
    apply_sort(tracker, &mut snapshot, sort);
    ApiResponse::ok(snapshot)
}

fn apply_sort(
    tracker: &PortfolioTracker,
    snapshot: &mut PortfolioSnapshot,
    sort: Option<(HoldingSortField, SortDirection)>,
) {
    let Some((field, direction)) = sort else {
        return;
    };
    tracker.sort_holdings(&mut snapshot.holdings, field, direction);
    for sector in &mut snapshot.sector_summaries {
        tracker.sort_holdings(&mut sector.holdings, field, direction);
    }
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {o}");
                    None
                }
            })
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let api = Router::new()
        .route("/healthz", get(healthz))
        .route("/portfolio", get(full_portfolio))
        .route("/portfolio/static", get(static_portfolio))
        .route("/portfolio/dynamic", get(dynamic_portfolio))
        .route("/portfolio/refresh", post(refresh_portfolio));

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}
