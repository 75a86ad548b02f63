//! Behavior-driven tests for the JSON HTTP surface.
//!
//! Each scenario drives the full router with a scripted transport and
//! asserts on the JSON envelope a client would see.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tower::ServiceExt;

use twboard_core::http_client::HttpClient;
use twboard_tests::{
    daily_index_body, Acquirer, HttpResponse, ResourceCache, ResourceService, StaticHttpClient,
};
use twboard_web::{router, AppState};

fn app(client: StaticHttpClient) -> axum::Router {
    let http: Arc<dyn HttpClient> = Arc::new(client);
    let acquirer = Arc::new(Acquirer::new(Arc::clone(&http)).with_pacing(Duration::ZERO));
    router(AppState::with_parts(
        acquirer,
        ResourceService::new(http),
        ResourceCache::default(),
    ))
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request builds"))
        .await
        .expect("router responds");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body reads")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).expect("body is JSON");
    (status, body)
}

fn directory_body() -> String {
    serde_json::json!([
        {
            "公司代號": "2330",
            "公司簡稱": "台積電",
            "公司名稱": "台灣積體電路製造股份有限公司",
            "產業別": "24",
            "董事長": "魏哲家",
            "上市日期": "19940905",
            "網址": "https://www.tsmc.com"
        }
    ])
    .to_string()
}

// =============================================================================
// API: Daily Universe
// =============================================================================

#[tokio::test]
async fn stock_data_returns_the_upstream_envelope() {
    let app = app(
        StaticHttpClient::new().with_response("MI_INDEX", Ok(HttpResponse::ok_json(daily_index_body()))),
    );

    let (status, body) = get_json(app, "/api/stock-data").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["stat"], "OK");
    assert!(body["data"]["data9"].is_array());
    assert!(body["data"].get("isHistoricalData").is_none());
}

#[tokio::test]
async fn stock_data_surfaces_exhaustion_as_a_gateway_error() {
    let app = app(StaticHttpClient::new());

    let (status, body) = get_json(app, "/api/stock-data").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "source.exhausted");
}

#[tokio::test]
async fn stock_rankings_apply_the_requested_filter() {
    let app = app(
        StaticHttpClient::new().with_response("MI_INDEX", Ok(HttpResponse::ok_json(daily_index_body()))),
    );

    let (status, body) =
        get_json(app, "/api/stock-rankings?type=price&condition=greater&value=100").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["code"], "2330");
    assert_eq!(body["data"][0]["rank"], 1);
}

#[tokio::test]
async fn stock_rankings_without_a_filter_return_the_whole_ranked_set() {
    let app = app(
        StaticHttpClient::new().with_response("MI_INDEX", Ok(HttpResponse::ok_json(daily_index_body()))),
    );

    let (status, body) = get_json(app, "/api/stock-rankings").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isHistoricalData"], false);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

// =============================================================================
// API: Ancillary Resources
// =============================================================================

#[tokio::test]
async fn stock_info_resolves_known_symbols_and_404s_unknown_ones() {
    let app = app(
        StaticHttpClient::new().with_response("t187ap03_L", Ok(HttpResponse::ok_json(directory_body()))),
    );

    let (status, body) = get_json(app.clone(), "/api/stock-info/2330").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["code"], "2330");
    assert_eq!(body["data"]["industry"], "半導體業");
    assert_eq!(body["fromCache"], false);

    let (status, body) = get_json(app, "/api/stock-info/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "source.symbol_not_found");
}

#[tokio::test]
async fn stock_finance_degrades_to_a_placeholder_instead_of_failing() {
    let app = app(StaticHttpClient::new());

    let (status, body) = get_json(app, "/api/stock-finance/2330").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["code"], "2330");
    assert_eq!(body["data"]["eps"], "N/A");
    assert_eq!(body["fromCache"], false);
    let last_updated = body["lastUpdated"].as_str().expect("timestamp present");
    OffsetDateTime::parse(last_updated, &Rfc3339).expect("RFC 3339 timestamp");
}

#[tokio::test]
async fn industries_fall_back_to_the_sample_table_when_upstream_is_down() {
    let app = app(StaticHttpClient::new());

    let (status, body) = get_json(app, "/api/industries").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isSampleData"], true);
    assert!(!body["data"].as_array().map(Vec::is_empty).unwrap_or(true));
}

#[tokio::test]
async fn global_indices_report_cache_provenance() {
    let chart = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":22000.0,"previousClose":21800.0}}],"error":null}}"#;
    let app = app(
        StaticHttpClient::new().with_response("finance/chart", Ok(HttpResponse::ok_json(chart))),
    );

    let (status, body) = get_json(app, "/api/global-indices").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fromCache"], false);
    assert!(body.get("warning").is_none());
    let last_updated = body["lastUpdated"].as_str().expect("timestamp present");
    OffsetDateTime::parse(last_updated, &Rfc3339).expect("RFC 3339 timestamp");
}

// =============================================================================
// API: Health and Unknown Routes
// =============================================================================

#[tokio::test]
async fn health_reports_ok_with_a_timestamp() {
    let (status, body) = get_json(app(StaticHttpClient::new()), "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let timestamp = body["timestamp"].as_str().expect("timestamp present");
    OffsetDateTime::parse(timestamp, &Rfc3339).expect("RFC 3339 timestamp");
}

#[tokio::test]
async fn unknown_routes_answer_with_a_json_404() {
    let (status, body) = get_json(app(StaticHttpClient::new()), "/api/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "not_found");
}
