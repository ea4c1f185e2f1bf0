//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use hlt_core::{
    EnvSource, EnvironmentGuard, InfoApi, SdkError, SdkResult, Subscription, SubscriptionApi,
    Symbol,
};
use hlt_dashboard::{create_router, Clients, DashboardState};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

struct StubInfo;

#[async_trait]
impl InfoApi for StubInfo {
    async fn meta(&self) -> SdkResult<Value> {
        Ok(json!({"universe": [{"name": "BTC"}, {"name": "ETH"}]}))
    }

    async fn open_orders(&self, user: &str) -> SdkResult<Value> {
        Ok(json!([{"user": user, "oid": 7}]))
    }

    async fn l2_book(&self, symbol: &Symbol) -> SdkResult<Value> {
        Ok(json!({"coin": symbol.coin(), "levels": [[], []]}))
    }

    async fn all_mids(&self) -> SdkResult<Value> {
        Ok(json!({"ETH-PERP": "2000", "BTC-PERP": "50000", "@12": "3"}))
    }

    async fn clearinghouse_state(&self, _user: &str) -> SdkResult<Value> {
        Err(SdkError::Status {
            status: 500,
            body: "internal".into(),
        })
    }
}

struct StubSubscription;

#[async_trait]
impl Subscription for StubSubscription {
    async fn unsubscribe(&mut self) -> SdkResult<()> {
        Ok(())
    }
}

struct StubSubscriptions;

#[async_trait]
impl SubscriptionApi for StubSubscriptions {
    async fn subscribe_all_mids(
        &self,
        _sink: mpsc::Sender<Value>,
    ) -> SdkResult<Box<dyn Subscription>> {
        Ok(Box::new(StubSubscription))
    }
}

fn router(pairs: &[(&str, &str)]) -> Router {
    let guard = EnvironmentGuard::new(EnvSource::from_pairs(pairs.iter().copied()));
    let clients = Clients {
        info: Arc::new(StubInfo),
        exchange: None,
        subscriptions: Arc::new(StubSubscriptions),
    };
    create_router(DashboardState::new(guard, clients))
}

fn testnet_router() -> Router {
    router(&[("HL_IS_TESTNET", "true")])
}

async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_environment_reports_guard_failure() {
    let (status, body) = call(router(&[]), "GET", "/api/environment", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("HL_IS_TESTNET"));
}

#[tokio::test]
async fn test_environment_hides_credential() {
    let app = router(&[
        ("HL_IS_TESTNET", "true"),
        ("WALLET_PRIVATE_KEY", "0xdeadbeef"),
    ]);
    let (_, body) = call(app, "GET", "/api/environment", None).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["result"]["hasSigningCredential"], true);
    assert!(!body.to_string().contains("deadbeef"));
}

#[tokio::test]
async fn test_actions_fail_softly_outside_testnet() {
    let app = router(&[("HL_IS_TESTNET", "false")]);
    let (status, body) = call(
        app,
        "POST",
        "/api/info/open-orders",
        Some(json!({"address": "0xabc"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn test_open_orders() {
    let (_, body) = call(
        testnet_router(),
        "POST",
        "/api/info/open-orders",
        Some(json!({"address": "0xabc"})),
    )
    .await;
    assert_eq!(body, json!({"ok": true, "result": [{"user": "0xabc", "oid": 7}]}));
}

#[tokio::test]
async fn test_positions_error_message() {
    let (_, body) = call(
        testnet_router(),
        "POST",
        "/api/positions",
        Some(json!({"address": "0xabc"})),
    )
    .await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "Failed to fetch positions: HTTP 500: internal");
}

#[tokio::test]
async fn test_orderbook_and_unknown_market() {
    let (_, body) = call(
        testnet_router(),
        "POST",
        "/api/orderbook",
        Some(json!({"marketId": "1"})),
    )
    .await;
    assert_eq!(body["result"]["coin"], "ETH");

    let (_, body) = call(
        testnet_router(),
        "POST",
        "/api/orderbook",
        Some(json!({"marketId": "42"})),
    )
    .await;
    assert_eq!(body["error"], "Unknown market id: 42");
}

#[tokio::test]
async fn test_order_dry_run_without_credential() {
    let (_, body) = call(
        testnet_router(),
        "POST",
        "/api/order",
        Some(json!({"marketId": "0", "price": "1000", "size": "0.01", "dryRun": false})),
    )
    .await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["result"]["status"], "dry_run");
    assert_eq!(body["result"]["reason"], "no_credential");
    assert_eq!(body["result"]["payload"]["coin"], "BTC-PERP");
    assert_eq!(body["result"]["payload"]["limit_px"], "1000");
}

#[tokio::test]
async fn test_live_connect_and_events() {
    let app = testnet_router();

    let (_, body) = call(app.clone(), "POST", "/api/live/connect", None).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["result"]["connected"], true);

    let (_, body) = call(app.clone(), "GET", "/api/live/events?page=1", None).await;
    assert_eq!(body["result"]["totalEvents"], 2);
    assert_eq!(body["result"]["status"]["connected"], true);

    let (_, body) = call(app.clone(), "POST", "/api/live/disconnect", None).await;
    assert_eq!(body["result"]["connected"], false);

    let (_, body) = call(app, "POST", "/api/live/clear", None).await;
    assert_eq!(body["result"]["events"], 0);
}

#[tokio::test]
async fn test_polling_snapshot() {
    let app = testnet_router();

    let (_, body) = call(app.clone(), "POST", "/api/live/polling/start", None).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["result"]["polling"], true);
    let rows = body["result"]["snapshot"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["coin"], "BTC-PERP");

    let (_, body) = call(app, "POST", "/api/live/polling/stop", None).await;
    assert_eq!(body["result"]["polling"], false);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = testnet_router();
    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
