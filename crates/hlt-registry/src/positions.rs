//! Position response normalization.
//!
//! Position payloads come in two shapes depending on the SDK method that
//! produced them:
//! - a list under `assetPositions` (or `positions`), each entry either the
//!   record itself or `{type, position: {...}, leverage: {...}}`
//! - a map under `positions` keyed by coin
//!
//! Values are copied through as raw JSON scalars; nothing here fails.

use serde::Serialize;
use serde_json::{Map, Value};

/// Flattened position record for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPosition {
    pub coin: String,
    pub size: Value,
    pub entry_price: Value,
    pub position_value: Value,
    pub unrealized_pnl: Value,
    pub return_on_equity: Value,
    pub liquidation_price: Value,
    pub margin_used: Value,
    pub max_leverage: Value,
    #[serde(rename = "type")]
    pub kind: Value,
}

/// First non-null field of `record` among `keys`, else `Value::Null`.
fn pick(record: &Value, keys: &[&str]) -> Value {
    keys.iter()
        .filter_map(|key| record.get(key))
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null)
}

fn present<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    payload.get(key).filter(|v| !v.is_null())
}

fn size_of(record: &Value) -> Value {
    match pick(record, &["szi", "size"]) {
        Value::Null => Value::from(0),
        size => size,
    }
}

fn coin_of(record: &Value) -> String {
    match pick(record, &["coin", "symbol"]) {
        Value::String(s) => s,
        Value::Null => "UNKNOWN".to_string(),
        other => other.to_string(),
    }
}

fn from_list_entry(entry: &Value) -> Option<NormalizedPosition> {
    if entry.is_null() {
        return None;
    }
    let record = present(entry, "position").unwrap_or(entry);

    let max_leverage = match entry.pointer("/leverage/maxLeverage") {
        Some(v) if !v.is_null() => v.clone(),
        _ => pick(record, &["maxLeverage"]),
    };
    let kind = match present(entry, "type") {
        Some(v) => v.clone(),
        None => pick(record, &["type"]),
    };

    Some(NormalizedPosition {
        coin: coin_of(record),
        size: size_of(record),
        entry_price: pick(record, &["entryPx", "entry_price"]),
        position_value: pick(record, &["positionValue", "position_value"]),
        unrealized_pnl: pick(record, &["unrealizedPnl", "uPnl"]),
        return_on_equity: pick(record, &["returnOnEquity", "roe"]),
        liquidation_price: pick(record, &["liquidationPx", "liqPx"]),
        margin_used: pick(record, &["marginUsed"]),
        max_leverage,
        kind,
    })
}

fn from_map_entry(coin: &str, record: &Value) -> Option<NormalizedPosition> {
    if record.is_null() {
        return None;
    }
    Some(NormalizedPosition {
        coin: coin.to_string(),
        size: size_of(record),
        entry_price: pick(record, &["entryPx"]),
        position_value: pick(record, &["positionValue"]),
        unrealized_pnl: pick(record, &["unrealizedPnl"]),
        return_on_equity: pick(record, &["returnOnEquity"]),
        liquidation_price: pick(record, &["liquidationPx"]),
        margin_used: pick(record, &["marginUsed"]),
        max_leverage: pick(record, &["maxLeverage"]),
        kind: Value::Null,
    })
}

/// Normalize any supported positions payload.
pub fn normalize_positions(raw: &Value) -> Vec<NormalizedPosition> {
    let list = present(raw, "assetPositions")
        .or_else(|| present(raw, "positions"))
        .and_then(Value::as_array);

    let positions: Vec<_> = list
        .into_iter()
        .flatten()
        .filter_map(from_list_entry)
        .collect();
    if !positions.is_empty() {
        return positions;
    }

    present(raw, "positions")
        .and_then(Value::as_object)
        .map(|map: &Map<String, Value>| {
            map.iter()
                .filter_map(|(coin, record)| from_map_entry(coin, record))
                .collect()
        })
        .unwrap_or_default()
}
