//! JSON HTTP surface over the twboard pipeline.
//!
//! Handlers own no pipeline logic: each one resolves a resource through
//! the acquirer or the TTL cache and wraps the result in a small response
//! envelope (`fromCache`, `lastUpdated`, degradation flags).

pub mod error;

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tower_http::cors::CorsLayer;
use tracing::warn;

use twboard_core::cache::CacheOutcome;
use twboard_core::{
    filter, normalize_envelope, rank, Acquirer, Cached, FilterCondition, FilterField,
    FinanceSnapshot, HttpClient, ResourceCache, ResourceKey, ResourceService, StockFilter,
};

use crate::error::ApiError;

/// Shared handler state; clones share the acquirer, fetchers and cache.
#[derive(Clone)]
pub struct AppState {
    acquirer: Arc<Acquirer>,
    resources: ResourceService,
    cache: ResourceCache,
}

impl AppState {
    /// Production state over one shared transport.
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            acquirer: Arc::new(Acquirer::new(Arc::clone(&http))),
            resources: ResourceService::new(http),
            cache: ResourceCache::default(),
        }
    }

    pub fn with_parts(
        acquirer: Arc<Acquirer>,
        resources: ResourceService,
        cache: ResourceCache,
    ) -> Self {
        Self {
            acquirer,
            resources,
            cache,
        }
    }
}

/// The full API router with permissive CORS and a JSON 404 fallback.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/stock-data", get(stock_data))
        .route("/api/stock-rankings", get(stock_rankings))
        .route("/api/global-indices", get(global_indices))
        .route("/api/industries", get(industries))
        .route("/api/etf-list", get(etf_list))
        .route("/api/stock-info/:symbol", get(stock_info))
        .route("/api/stock-finance/:symbol", get(stock_finance))
        .route("/api/health", get(health))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Latest daily universe in the upstream envelope layout, with historical
/// tagging when the acquisition had to step back in time.
async fn stock_data(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let envelope = state.acquirer.acquire_daily_data().await?;
    Ok(Json(json!({ "success": true, "data": envelope })))
}

#[derive(Debug, Deserialize)]
struct RankingParams {
    #[serde(rename = "type")]
    field: Option<FilterField>,
    condition: Option<FilterCondition>,
    #[serde(default)]
    value: String,
}

/// Top instruments by volume, optionally narrowed by a filter query.
async fn stock_rankings(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<impl IntoResponse, ApiError> {
    let envelope = state.acquirer.acquire_daily_data().await?;
    let is_historical = envelope.is_historical_data.unwrap_or(false);
    let records = normalize_envelope(&envelope)?;
    let mut ranked = rank(records);

    if let (Some(field), Some(condition)) = (params.field, params.condition) {
        let query = StockFilter {
            field,
            condition,
            value: params.value,
        };
        ranked = filter(&ranked, &query);
    }

    Ok(Json(json!({
        "success": true,
        "total": ranked.len(),
        "isHistoricalData": is_historical,
        "data": ranked,
    })))
}

/// Tracked global indices; an expired cache entry is served as a degraded
/// fallback when every upstream quote fails.
async fn global_indices(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let resources = state.resources.clone();
    let cached = state
        .cache
        .get_or_fetch_with_stale_fallback(ResourceKey::GlobalIndices, move || async move {
            resources.fetch_global_indices().await
        })
        .await?;

    let mut body = json!({
        "success": true,
        "data": cached.value,
        "fromCache": cached.outcome.from_cache(),
        "lastUpdated": rfc3339(cached.fetched_at),
    });
    if cached.outcome == CacheOutcome::StaleFallback {
        body["warning"] = json!("serving cached data after an upstream failure");
    }
    Ok(Json(body))
}

/// Industry code table; upstream failure degrades to the built-in sample
/// table, marked and never cached.
async fn industries(State(state): State<AppState>) -> impl IntoResponse {
    let resources = state.resources.clone();
    let outcome = state
        .cache
        .get_or_fetch(ResourceKey::Industries, move || async move {
            resources.fetch_industries().await
        })
        .await;

    match outcome {
        Ok(cached) => Json(json!({
            "success": true,
            "data": cached.value,
            "isSampleData": false,
            "fromCache": cached.outcome.from_cache(),
            "lastUpdated": rfc3339(cached.fetched_at),
        })),
        Err(error) => {
            warn!(error = %error, "serving sample industry table after fetch failure");
            Json(json!({
                "success": true,
                "data": twboard_core::sample_industries(),
                "isSampleData": true,
            }))
        }
    }
}

async fn etf_list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let resources = state.resources.clone();
    let cached = state
        .cache
        .get_or_fetch(ResourceKey::EtfList, move || async move {
            resources.fetch_etf_list().await
        })
        .await?;
    Ok(Json(enveloped(cached)))
}

async fn stock_info(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let resources = state.resources.clone();
    let lookup = symbol.clone();
    let cached = state
        .cache
        .get_or_fetch(ResourceKey::StockInfo(symbol), move || async move {
            resources.fetch_stock_profile(&lookup).await
        })
        .await?;
    Ok(Json(enveloped(cached)))
}

/// Per-symbol financials. A failed fetch degrades to an uncached `"N/A"`
/// placeholder; this endpoint never surfaces an upstream error.
async fn stock_finance(State(state): State<AppState>, Path(symbol): Path<String>) -> Json<serde_json::Value> {
    let resources = state.resources.clone();
    let lookup = symbol.clone();
    let outcome = state
        .cache
        .get_or_fetch(ResourceKey::StockFinance(symbol.clone()), move || async move {
            resources.fetch_finance(&lookup).await
        })
        .await;

    match outcome {
        Ok(cached) => Json(enveloped(cached)),
        Err(error) => {
            warn!(symbol = %symbol, error = %error, "serving finance placeholder after fetch failure");
            Json(json!({
                "success": true,
                "data": FinanceSnapshot::unavailable(&symbol),
                "fromCache": false,
                "lastUpdated": rfc3339(OffsetDateTime::now_utc()),
            }))
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": rfc3339(OffsetDateTime::now_utc()),
    }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "not_found",
            "message": "unknown endpoint",
        })),
    )
}

fn enveloped<T: serde::Serialize>(cached: Cached<T>) -> serde_json::Value {
    json!({
        "success": true,
        "data": cached.value,
        "fromCache": cached.outcome.from_cache(),
        "lastUpdated": rfc3339(cached.fetched_at),
    })
}

fn rfc3339(moment: OffsetDateTime) -> String {
    moment.format(&Rfc3339).unwrap_or_default()
}
