//! Query executors.
//!
//! Every action has the same shape:
//! 1. re-run the testnet guard
//! 2. validate user input (no network call on failure)
//! 3. resolve the market id when the action needs one
//! 4. perform exactly one external call
//! 5. normalize the result
//!
//! Each dashboard panel owns its own `Executor`, and with it its own
//! resolver cache.

use crate::error::{ActionError, ActionResult};
use hlt_core::{
    EnvironmentConfig, EnvironmentGuard, ExchangeApi, FormDefaults, InfoApi, OrderRequest,
    SdkError, Symbol, TimeInForce,
};
use hlt_registry::{normalize_positions, MarketResolver, NormalizedPosition};
use hlt_telemetry::Metrics;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const ACTION_OPEN_ORDERS: &str = "fetch open orders";
pub const ACTION_POSITIONS: &str = "fetch positions";
pub const ACTION_ORDERBOOK: &str = "fetch orderbook";
pub const ACTION_PLACE_ORDER: &str = "place order";

const POSITIONS_NOT_FOUND: &str =
    "Positions endpoint (tried clearinghouseState, userPositions, userState, getUserState)";

fn default_true() -> bool {
    true
}

/// Order form input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderForm {
    pub market_id: String,
    pub price: String,
    pub size: String,
    #[serde(default = "default_true")]
    pub is_buy: bool,
    #[serde(default = "default_true")]
    pub dry_run: bool,
    #[serde(default)]
    pub tif: TimeInForce,
}

impl OrderForm {
    /// Form prefilled from configuration defaults (buy, GTC).
    pub fn from_defaults(defaults: &FormDefaults, dry_run: bool) -> Self {
        Self {
            market_id: defaults.market_id.clone(),
            price: defaults.price.clone(),
            size: defaults.size.clone(),
            is_buy: true,
            dry_run,
            tif: TimeInForce::Gtc,
        }
    }
}

/// Why an order was built but not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DryRunReason {
    /// No signing credential is configured.
    NoCredential,
    /// A credential exists but the dry-run toggle is on.
    Toggle,
}

impl DryRunReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoCredential => "Dry-run: No private key provided, not signing/sending.",
            Self::Toggle => {
                "Dry-run mode: Order constructed but not broadcast. Disable dry-run to actually send."
            }
        }
    }

    fn metric_label(&self) -> &'static str {
        match self {
            Self::NoCredential => "dry_run_no_credential",
            Self::Toggle => "dry_run_toggle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderStatus {
    DryRun {
        reason: DryRunReason,
        message: &'static str,
    },
    Submitted {
        response: Value,
    },
}

/// The payload that was built and what happened to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderOutcome {
    pub payload: OrderRequest,
    #[serde(flatten)]
    pub status: OrderStatus,
}

impl OrderOutcome {
    pub fn is_dry_run(&self) -> bool {
        matches!(self.status, OrderStatus::DryRun { .. })
    }
}

/// Raw positions response plus its normalized form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionsView {
    pub raw: Value,
    pub positions: Vec<NormalizedPosition>,
}

/// Executor for one panel.
pub struct Executor {
    guard: EnvironmentGuard,
    info: Arc<dyn InfoApi>,
    exchange: Option<Arc<dyn ExchangeApi>>,
    resolver: MarketResolver,
}

impl Executor {
    pub fn new(guard: EnvironmentGuard, info: Arc<dyn InfoApi>) -> Self {
        Self {
            guard,
            resolver: MarketResolver::new(Arc::clone(&info)),
            info,
            exchange: None,
        }
    }

    /// Attach the exchange client used for live submission.
    pub fn with_exchange(mut self, exchange: Arc<dyn ExchangeApi>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    pub fn resolver(&self) -> &MarketResolver {
        &self.resolver
    }

    fn check(&self) -> ActionResult<EnvironmentConfig> {
        Ok(self.guard.check()?)
    }

    /// Open orders for `address`.
    pub async fn open_orders(&self, address: &str) -> ActionResult<Value> {
        let result = self.open_orders_inner(address).await;
        record("open_orders", &result);
        result
    }

    async fn open_orders_inner(&self, address: &str) -> ActionResult<Value> {
        self.check()?;
        let address = required(address, "Address")?;

        info!(user = %address, "Fetching open orders");
        let orders = self
            .info
            .open_orders(address)
            .await
            .map_err(|e| ActionError::transport(ACTION_OPEN_ORDERS, e))?;
        Ok(non_null(orders))
    }

    /// Positions for `address`, trying each positions method in turn.
    pub async fn positions(&self, address: &str) -> ActionResult<PositionsView> {
        let result = self.positions_inner(address).await;
        record("positions", &result);
        result
    }

    async fn positions_inner(&self, address: &str) -> ActionResult<PositionsView> {
        self.check()?;
        let address = required(address, "Address")?;

        info!(user = %address, "Fetching positions");
        let raw = self
            .fetch_positions(address)
            .await
            .map_err(|e| ActionError::transport(ACTION_POSITIONS, e))?;
        let raw = non_null(raw);
        let positions = normalize_positions(&raw);
        debug!(count = positions.len(), "Normalized positions");
        Ok(PositionsView { raw, positions })
    }

    async fn fetch_positions(&self, address: &str) -> Result<Value, SdkError> {
        match self.info.clearinghouse_state(address).await {
            Err(e) if e.is_unsupported() => {}
            other => return other,
        }
        match self.info.user_positions(address).await {
            Err(e) if e.is_unsupported() => {}
            other => return other,
        }
        match self.info.user_state(address).await {
            Err(e) if e.is_unsupported() => {}
            other => return other,
        }
        match self.info.get_user_state(address).await {
            Err(e) if e.is_unsupported() => Err(SdkError::Unsupported(POSITIONS_NOT_FOUND)),
            other => other,
        }
    }

    /// L2 book for `market_id`, resolved without touching the directory cache.
    pub async fn orderbook(&self, market_id: &str) -> ActionResult<Value> {
        let result = self.orderbook_inner(market_id).await;
        record("orderbook", &result);
        result
    }

    async fn orderbook_inner(&self, market_id: &str) -> ActionResult<Value> {
        self.check()?;
        let market_id = required(market_id, "Market id")?;

        let symbol = self
            .resolver
            .lookup_symbol(market_id)
            .await
            .ok_or_else(|| ActionError::UnknownMarket(market_id.to_string()))?;

        info!(market_id, symbol = %symbol, "Fetching orderbook");
        let book = match self.info.l2_book(&symbol).await {
            Err(e) if e.is_unsupported() => self.info.orderbook(&symbol).await,
            other => other,
        }
        .map_err(|e| ActionError::transport(ACTION_ORDERBOOK, e))?;
        Ok(non_null(book))
    }

    /// Build the order payload and submit it only when a credential is set
    /// and the dry-run toggle is off.
    pub async fn place_order(&self, form: &OrderForm) -> ActionResult<OrderOutcome> {
        let result = self.place_order_inner(form).await;
        record("place_order", &result);
        if let Ok(outcome) = &result {
            Metrics::order(match &outcome.status {
                OrderStatus::DryRun { reason, .. } => reason.metric_label(),
                OrderStatus::Submitted { .. } => "submitted",
            });
        }
        result
    }

    /// Validate the form and build the payload without sending anything.
    pub async fn prepare_order(&self, form: &OrderForm) -> ActionResult<OrderRequest> {
        self.check()?;
        self.build_payload(form).await
    }

    async fn build_payload(&self, form: &OrderForm) -> ActionResult<OrderRequest> {
        let market_id = required(&form.market_id, "Market id")?;
        let limit_px = positive_decimal(&form.price, "Price")?;
        let sz = positive_decimal(&form.size, "Size")?;

        let coin = self
            .resolver
            .resolve_symbol(market_id)
            .await
            .ok_or_else(|| ActionError::UnknownMarket(market_id.to_string()))?;
        let asset = asset_index(market_id, &coin)?;

        let payload = OrderRequest::limit(coin, asset, form.is_buy, limit_px, sz, form.tif);
        debug!(?payload, "Prepared order payload");
        Ok(payload)
    }

    async fn place_order_inner(&self, form: &OrderForm) -> ActionResult<OrderOutcome> {
        let config = self.check()?;
        let payload = self.build_payload(form).await?;

        let dry_run = |reason: DryRunReason| -> ActionResult<OrderOutcome> {
            info!(reason = ?reason, "{}", reason.message());
            Ok(OrderOutcome {
                payload: payload.clone(),
                status: OrderStatus::DryRun {
                    reason,
                    message: reason.message(),
                },
            })
        };

        if !config.has_signing_credential() {
            return dry_run(DryRunReason::NoCredential);
        }
        if form.dry_run {
            return dry_run(DryRunReason::Toggle);
        }

        let exchange = self
            .exchange
            .as_ref()
            .ok_or_else(|| ActionError::transport(ACTION_PLACE_ORDER, SdkError::MissingCredential))?;

        let response = exchange
            .place_order(&payload)
            .await
            .map_err(|e| ActionError::transport(ACTION_PLACE_ORDER, e))?;

        Ok(OrderOutcome {
            payload,
            status: OrderStatus::Submitted { response },
        })
    }
}

fn record<T>(action: &str, result: &ActionResult<T>) {
    match result {
        Ok(_) => Metrics::action(action, "ok"),
        Err(e) => {
            warn!(action, error = %e, "Action failed");
            Metrics::action(action, e.kind());
        }
    }
}

fn required<'a>(value: &'a str, field: &str) -> ActionResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ActionError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

fn positive_decimal(value: &str, field: &str) -> ActionResult<Decimal> {
    match Decimal::from_str(value.trim()) {
        Ok(d) if d > Decimal::ZERO => Ok(d),
        _ => Err(ActionError::Validation(format!(
            "{field} must be a positive number, got '{value}'"
        ))),
    }
}

/// Directory keys are universe indices, so a resolved id always parses.
fn asset_index(market_id: &str, coin: &Symbol) -> ActionResult<u32> {
    market_id.parse().map_err(|_| {
        warn!(market_id, coin = %coin, "Resolved market id is not an index");
        ActionError::UnknownMarket(market_id.to_string())
    })
}

fn non_null(value: Value) -> Value {
    if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    }
}
