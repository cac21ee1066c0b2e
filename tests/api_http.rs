// tests/api_http.rs
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use chrono::{TimeZone, Utc};
use http::{Request, StatusCode};
use tower::ServiceExt;

use stocktwits_pulse::api::{create_router, AppState};
use stocktwits_pulse::ingest::providers::fixture::FixtureFeed;
use stocktwits_pulse::{ingest_symbol, MemoryStore, MessageStore};

const AAPL: &str = include_str!("fixtures/aapl_stream.json");

async fn app() -> axum::Router {
    let store = Arc::new(MemoryStore::new());
    let feed = FixtureFeed::from_fixture_str("AAPL", AAPL);
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
    ingest_symbol(&feed, store.as_ref(), "AAPL", now).await.unwrap();

    let store: Arc<dyn MessageStore> = store;
    create_router(AppState { store }, None)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = get(app().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn profile_exposes_temperature() {
    let (status, body) = get(app().await, "/profiles/AAPL").await;
    assert_eq!(status, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["symbol"], "AAPL");
    assert_eq!(v["temperature"]["last10Minutes"], 1);
    assert_eq!(v["temperature"]["last1Hour"], 1);
    assert_eq!(v["temperature"]["last3Hours"], 1);
}

#[tokio::test]
async fn profiles_list_and_missing_symbol() {
    let app = app().await;
    let (status, body) = get(app.clone(), "/profiles").await;
    assert_eq!(status, StatusCode::OK);
    let v: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(v.len(), 1);

    let (status, _) = get(app, "/profiles/ZZZZ").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
