//! Executor behaviour against mocked SDK clients.

use async_trait::async_trait;
use hlt_core::{
    EnvSource, EnvironmentGuard, ExchangeApi, InfoApi, OrderRequest, SdkError, SdkResult, Symbol,
    TimeInForce,
};
use hlt_executor::{ActionError, DryRunReason, Executor, OrderForm, OrderStatus};
use mockall::mock;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;

const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

mock! {
    pub Info {}

    #[async_trait]
    impl InfoApi for Info {
        async fn meta(&self) -> SdkResult<Value>;
        async fn open_orders(&self, user: &str) -> SdkResult<Value>;
        async fn l2_book(&self, symbol: &Symbol) -> SdkResult<Value>;
        async fn all_mids(&self) -> SdkResult<Value>;
        async fn clearinghouse_state(&self, user: &str) -> SdkResult<Value>;
        async fn user_positions(&self, user: &str) -> SdkResult<Value>;
        async fn user_state(&self, user: &str) -> SdkResult<Value>;
        async fn get_user_state(&self, user: &str) -> SdkResult<Value>;
        async fn orderbook(&self, symbol: &Symbol) -> SdkResult<Value>;
    }
}

mock! {
    pub Exchange {}

    #[async_trait]
    impl ExchangeApi for Exchange {
        async fn place_order(&self, order: &OrderRequest) -> SdkResult<Value>;
    }
}

fn guard(extra: &[(&str, &str)]) -> EnvironmentGuard {
    let mut pairs = vec![("HL_IS_TESTNET", "true")];
    pairs.extend_from_slice(extra);
    EnvironmentGuard::new(EnvSource::from_pairs(pairs))
}

fn meta() -> Value {
    json!({"universe": [{"name": "BTC"}, {"name": "ETH"}, {"name": "SOL"}]})
}

fn form(market_id: &str, dry_run: bool) -> OrderForm {
    OrderForm {
        market_id: market_id.to_string(),
        price: "1000".to_string(),
        size: "0.01".to_string(),
        is_buy: true,
        dry_run,
        tif: TimeInForce::Gtc,
    }
}

#[tokio::test]
async fn test_guard_failure_makes_no_calls() {
    let info = MockInfo::new();
    let executor = Executor::new(EnvironmentGuard::new(EnvSource::default()), Arc::new(info));

    let err = executor.open_orders("0xabc").await.unwrap_err();
    assert!(matches!(err, ActionError::Config(_)));
    assert!(err.to_string().contains("HL_IS_TESTNET"));
}

#[tokio::test]
async fn test_empty_input_makes_no_calls() {
    let info = MockInfo::new();
    let executor = Executor::new(guard(&[]), Arc::new(info));

    assert!(matches!(
        executor.open_orders("  ").await,
        Err(ActionError::Validation(_))
    ));
    assert!(matches!(
        executor.positions("").await,
        Err(ActionError::Validation(_))
    ));
    assert!(matches!(
        executor.orderbook("").await,
        Err(ActionError::Validation(_))
    ));
    assert!(matches!(
        executor.place_order(&form("", true)).await,
        Err(ActionError::Validation(_))
    ));
}

#[tokio::test]
async fn test_invalid_price_makes_no_calls() {
    let executor = Executor::new(guard(&[]), Arc::new(MockInfo::new()));
    let mut bad = form("0", true);
    bad.price = "-5".to_string();

    let err = executor.place_order(&bad).await.unwrap_err();
    assert!(matches!(err, ActionError::Validation(_)));
}

#[tokio::test]
async fn test_open_orders_passes_trimmed_address() {
    let mut info = MockInfo::new();
    info.expect_open_orders()
        .withf(|user| user.to_string() == "0xabc")
        .times(1)
        .returning(|_| Ok(json!([{"oid": 1}])));
    let executor = Executor::new(guard(&[]), Arc::new(info));

    let orders = executor.open_orders(" 0xabc ").await.unwrap();
    assert_eq!(orders, json!([{"oid": 1}]));
}

#[tokio::test]
async fn test_open_orders_transport_error_message() {
    let mut info = MockInfo::new();
    info.expect_open_orders()
        .returning(|_| Err(SdkError::Http("connection refused".into())));
    let executor = Executor::new(guard(&[]), Arc::new(info));

    let err = executor.open_orders("0xabc").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to fetch open orders: HTTP request failed: connection refused"
    );
}

#[tokio::test]
async fn test_positions_fallback_skips_unsupported() {
    let mut info = MockInfo::new();
    info.expect_clearinghouse_state()
        .times(1)
        .returning(|_| Err(SdkError::Unsupported("getClearinghouseState")));
    info.expect_user_positions()
        .times(1)
        .returning(|_| Err(SdkError::Unsupported("getUserPositions")));
    info.expect_user_state().times(1).returning(|_| {
        Ok(json!({
            "assetPositions": [{
                "type": "oneWay",
                "position": {"coin": "BTC", "szi": "0.5", "entryPx": "50000"}
            }]
        }))
    });
    let executor = Executor::new(guard(&[]), Arc::new(info));

    let view = executor.positions("0xabc").await.unwrap();
    assert_eq!(view.positions.len(), 1);
    assert_eq!(view.positions[0].coin, "BTC");
    assert_eq!(view.positions[0].size, json!("0.5"));
    assert!(view.raw.get("assetPositions").is_some());
}

#[tokio::test]
async fn test_positions_stops_at_first_supported() {
    let mut info = MockInfo::new();
    info.expect_clearinghouse_state()
        .times(1)
        .returning(|_| Ok(json!({"assetPositions": []})));
    info.expect_user_positions().never();
    info.expect_user_state().never();
    info.expect_get_user_state().never();
    let executor = Executor::new(guard(&[]), Arc::new(info));

    let view = executor.positions("0xabc").await.unwrap();
    assert!(view.positions.is_empty());
}

#[tokio::test]
async fn test_positions_none_supported() {
    let mut info = MockInfo::new();
    info.expect_clearinghouse_state()
        .returning(|_| Err(SdkError::Unsupported("getClearinghouseState")));
    info.expect_user_positions()
        .returning(|_| Err(SdkError::Unsupported("getUserPositions")));
    info.expect_user_state()
        .returning(|_| Err(SdkError::Unsupported("userState")));
    info.expect_get_user_state()
        .returning(|_| Err(SdkError::Unsupported("getUserState")));
    let executor = Executor::new(guard(&[]), Arc::new(info));

    let err = executor.positions("0xabc").await.unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Failed to fetch positions:"));
    assert!(message.contains("clearinghouseState"));
    assert!(message.contains("userState"));
    assert!(message.contains("getUserState"));
}

#[tokio::test]
async fn test_positions_reach_get_user_state() {
    let mut info = MockInfo::new();
    info.expect_clearinghouse_state()
        .times(1)
        .returning(|_| Err(SdkError::Unsupported("getClearinghouseState")));
    info.expect_user_positions()
        .times(1)
        .returning(|_| Err(SdkError::Unsupported("getUserPositions")));
    info.expect_user_state()
        .times(1)
        .returning(|_| Err(SdkError::Unsupported("userState")));
    info.expect_get_user_state()
        .withf(|user| user.to_string() == "0xabc")
        .times(1)
        .returning(|_| Ok(json!({"positions": [{"coin": "ETH", "size": "2"}]})));
    let executor = Executor::new(guard(&[]), Arc::new(info));

    let view = executor.positions("0xabc").await.unwrap();
    assert_eq!(view.positions.len(), 1);
    assert_eq!(view.positions[0].coin, "ETH");
}

#[tokio::test]
async fn test_positions_real_error_is_not_skipped() {
    let mut info = MockInfo::new();
    info.expect_clearinghouse_state().returning(|_| {
        Err(SdkError::Status {
            status: 500,
            body: "boom".into(),
        })
    });
    info.expect_user_positions().never();
    info.expect_user_state().never();
    info.expect_get_user_state().never();
    let executor = Executor::new(guard(&[]), Arc::new(info));

    assert!(matches!(
        executor.positions("0xabc").await,
        Err(ActionError::Transport { .. })
    ));
}

#[tokio::test]
async fn test_orderbook_resolves_symbol() {
    let mut info = MockInfo::new();
    info.expect_meta().times(1).returning(|| Ok(meta()));
    info.expect_l2_book()
        .withf(|symbol| symbol.as_str() == "ETH-PERP")
        .times(1)
        .returning(|_| Ok(json!({"levels": [[], []]})));
    let executor = Executor::new(guard(&[]), Arc::new(info));

    let book = executor.orderbook("1").await.unwrap();
    assert_eq!(book, json!({"levels": [[], []]}));
    assert!(!executor.resolver().is_cached());
}

#[tokio::test]
async fn test_orderbook_falls_back_to_legacy_method() {
    let mut info = MockInfo::new();
    info.expect_meta().returning(|| Ok(meta()));
    info.expect_l2_book()
        .returning(|_| Err(SdkError::Unsupported("l2Book")));
    info.expect_orderbook()
        .times(1)
        .returning(|_| Ok(Value::Null));
    let executor = Executor::new(guard(&[]), Arc::new(info));

    assert_eq!(executor.orderbook("0").await.unwrap(), json!({}));
}

#[tokio::test]
async fn test_orderbook_unknown_market() {
    let mut info = MockInfo::new();
    info.expect_meta().returning(|| Ok(meta()));
    info.expect_l2_book().never();
    let executor = Executor::new(guard(&[]), Arc::new(info));

    let err = executor.orderbook("99").await.unwrap_err();
    assert_eq!(err.to_string(), "Unknown market id: 99");
}

#[tokio::test]
async fn test_order_without_credential_is_dry_run_even_with_toggle_off() {
    let mut info = MockInfo::new();
    info.expect_meta().times(1).returning(|| Ok(meta()));
    let mut exchange = MockExchange::new();
    exchange.expect_place_order().never();
    let executor =
        Executor::new(guard(&[]), Arc::new(info)).with_exchange(Arc::new(exchange));

    let outcome = executor.place_order(&form("2", false)).await.unwrap();
    assert!(matches!(
        outcome.status,
        OrderStatus::DryRun {
            reason: DryRunReason::NoCredential,
            ..
        }
    ));
    assert_eq!(outcome.payload.coin.as_str(), "SOL-PERP");
    assert_eq!(outcome.payload.asset, 2);
    assert_eq!(outcome.payload.limit_px, dec!(1000));
    assert_eq!(outcome.payload.sz, dec!(0.01));
}

#[tokio::test]
async fn test_order_with_toggle_is_dry_run() {
    let mut info = MockInfo::new();
    info.expect_meta().returning(|| Ok(meta()));
    let mut exchange = MockExchange::new();
    exchange.expect_place_order().never();
    let executor = Executor::new(guard(&[("WALLET_PRIVATE_KEY", TEST_PRIVATE_KEY)]), Arc::new(info))
        .with_exchange(Arc::new(exchange));

    let outcome = executor.place_order(&form("0", true)).await.unwrap();
    assert!(matches!(
        outcome.status,
        OrderStatus::DryRun {
            reason: DryRunReason::Toggle,
            ..
        }
    ));
}

#[tokio::test]
async fn test_order_is_submitted_when_live() {
    let mut info = MockInfo::new();
    info.expect_meta().times(1).returning(|| Ok(meta()));
    let mut exchange = MockExchange::new();
    exchange
        .expect_place_order()
        .withf(|order| order.coin.as_str() == "BTC-PERP" && order.asset == 0 && order.is_buy)
        .times(1)
        .returning(|_| Ok(json!({"status": "ok"})));
    let executor = Executor::new(guard(&[("WALLET_PRIVATE_KEY", TEST_PRIVATE_KEY)]), Arc::new(info))
        .with_exchange(Arc::new(exchange));

    let outcome = executor.place_order(&form("0", false)).await.unwrap();
    assert_eq!(
        outcome.status,
        OrderStatus::Submitted {
            response: json!({"status": "ok"})
        }
    );

    // Directory is cached after the first order.
    assert!(executor.resolver().is_cached());
    let again = executor.place_order(&form("1", true)).await.unwrap();
    assert_eq!(again.payload.coin.as_str(), "ETH-PERP");
}

#[tokio::test]
async fn test_order_live_without_exchange_client() {
    let mut info = MockInfo::new();
    info.expect_meta().returning(|| Ok(meta()));
    let executor = Executor::new(guard(&[("WALLET_PRIVATE_KEY", TEST_PRIVATE_KEY)]), Arc::new(info));

    let err = executor.place_order(&form("0", false)).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to place order: Exchange functionality not available. Please provide a valid private key."
    );
}

#[tokio::test]
async fn test_order_unknown_market() {
    let mut info = MockInfo::new();
    info.expect_meta().returning(|| Ok(meta()));
    let executor = Executor::new(guard(&[]), Arc::new(info));

    let err = executor.place_order(&form("135", true)).await.unwrap_err();
    assert!(matches!(err, ActionError::UnknownMarket(id) if id == "135"));
}
