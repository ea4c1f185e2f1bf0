//! Order payload shown to the user before anything is sent.

use crate::symbol::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Time-in-force for limit orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-til-cancelled.
    #[default]
    Gtc,
    /// Immediate-or-cancel.
    Ioc,
    /// Add-liquidity-only (post only).
    Alo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderType {
    pub tif: TimeInForce,
}

/// `{"limit": {"tif": "Gtc"}}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderType {
    pub limit: LimitOrderType,
}

impl OrderType {
    pub fn limit(tif: TimeInForce) -> Self {
        Self {
            limit: LimitOrderType { tif },
        }
    }
}

/// Limit order as displayed (and, when live, submitted).
///
/// `asset` is the market index the symbol was resolved from; the exchange
/// wire format addresses assets by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub coin: Symbol,
    pub asset: u32,
    pub is_buy: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub sz: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub limit_px: Decimal,
    pub order_type: OrderType,
    pub reduce_only: bool,
}

impl OrderRequest {
    /// Non-reduce-only limit order.
    pub fn limit(
        coin: Symbol,
        asset: u32,
        is_buy: bool,
        limit_px: Decimal,
        sz: Decimal,
        tif: TimeInForce,
    ) -> Self {
        Self {
            coin,
            asset,
            is_buy,
            sz,
            limit_px,
            order_type: OrderType::limit(tif),
            reduce_only: false,
        }
    }
}
