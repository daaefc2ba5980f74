//! Price Fetcher Integration Tests
//!
//! TTL caching under paused time, plus the HTTP client against a local
//! mock of the `simple/price` endpoint.
//!
//! Run with: cargo test --test price_fetcher_test -- --nocapture

mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use common::{init_logger, spawn_server, CountingPriceSource};
use dotvest::{fallback_prices, CoinGeckoSource, PriceError, PriceFetcher, PriceSource};
use serde_json::json;

const TTL: Duration = Duration::from_secs(300);

#[tokio::test(start_paused = true)]
async fn test_prices_cached_until_ttl_expires() {
    init_logger();
    let source = Arc::new(CountingPriceSource::default());
    let fetcher = PriceFetcher::new(source.clone(), TTL);

    let first = fetcher.prices().await;
    assert_eq!(first["DOT"], 7.5);
    assert_eq!(first["HDX"], 0.02);
    assert_eq!(source.calls(), 1);

    tokio::time::advance(Duration::from_secs(299)).await;
    let cached = fetcher.prices().await;
    assert_eq!(cached, first);
    assert_eq!(source.calls(), 1, "second call within TTL must hit the cache");

    tokio::time::advance(Duration::from_secs(2)).await;
    fetcher.prices().await;
    assert_eq!(source.calls(), 2, "expired cache must refetch");
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_forces_refetch() {
    let source = Arc::new(CountingPriceSource::default());
    let fetcher = PriceFetcher::new(source.clone(), TTL);

    fetcher.prices().await;
    fetcher.invalidate();
    fetcher.prices().await;
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_server_error_returns_fallback() {
    init_logger();
    let app = Router::new().route(
        "/simple/price",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = spawn_server(app).await;
    let source = Arc::new(CoinGeckoSource::new(format!("http://{}", addr)));

    let err = source.fetch(&["polkadot".to_string()]).await.unwrap_err();
    assert!(matches!(err, PriceError::Status(500)));

    let fetcher = PriceFetcher::new(source, TTL);
    assert_eq!(fetcher.prices().await, fallback_prices());
}

#[tokio::test]
async fn test_malformed_body_returns_fallback() {
    let app = Router::new().route("/simple/price", get(|| async { "not json" }));
    let addr = spawn_server(app).await;
    let source = Arc::new(CoinGeckoSource::new(format!("http://{}/", addr)));

    let err = source.fetch(&["polkadot".to_string()]).await.unwrap_err();
    assert!(matches!(err, PriceError::Decode(_)));

    let fetcher = PriceFetcher::new(source, TTL);
    assert_eq!(fetcher.prices().await["BNC"], 0.5);
}

#[tokio::test]
async fn test_batched_request_and_parse() {
    let seen: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();
    let app = Router::new().route(
        "/simple/price",
        get(move |Query(query): Query<HashMap<String, String>>| {
            let recorded = recorded.clone();
            async move {
                recorded.lock().unwrap().push(query);
                Json(json!({
                    "polkadot": { "usd": 6.25 },
                    "acala": { "usd": 0.05 },
                    "hydradx": { "usd": 0.011 },
                    "bifrost-native-coin": { "usd": 0.3 }
                }))
            }
        }),
    );
    let addr = spawn_server(app).await;
    let fetcher = PriceFetcher::new(
        Arc::new(CoinGeckoSource::new(format!("http://{}", addr))),
        TTL,
    );

    let prices = fetcher.prices().await;
    assert_eq!(prices["DOT"], 6.25);
    assert_eq!(prices["ACA"], 0.05);
    assert_eq!(prices["HDX"], 0.011);
    assert_eq!(prices["BNC"], 0.3);

    // Second call is served from the cache
    fetcher.prices().await;
    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].get("ids").map(String::as_str),
        Some("polkadot,acala,hydradx,bifrost-native-coin")
    );
    assert_eq!(requests[0].get("vs_currencies").map(String::as_str), Some("usd"));
}
