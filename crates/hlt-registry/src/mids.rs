//! Mid price snapshot normalization.

use chrono::{DateTime, Utc};
use hlt_core::has_perp_suffix;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MidRow {
    pub coin: String,
    /// NaN (serialized as `null`) when the source value is not numeric.
    pub mid: f64,
}

/// Polled mid prices, replaced wholesale on every poll.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MidSnapshot {
    pub rows: Vec<MidRow>,
    pub updated_at: DateTime<Utc>,
}

impl MidSnapshot {
    pub fn from_raw(raw: &Value) -> Self {
        Self {
            rows: normalize_mids(raw),
            updated_at: Utc::now(),
        }
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::Null => 0.0,
        _ => f64::NAN,
    }
}

fn first_present<'a>(entry: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| entry.get(key))
        .find(|v| !v.is_null())
}

/// Accepts `{coin: mid}` or `[{coin|symbol, mid|px|price}]`.
///
/// Keeps `-PERP` coins only, sorted by coin ignoring case.
pub fn normalize_mids(raw: &Value) -> Vec<MidRow> {
    let mut rows: Vec<MidRow> = match raw {
        Value::Object(map) => map
            .iter()
            .map(|(coin, mid)| MidRow {
                coin: coin.clone(),
                mid: as_f64(mid),
            })
            .collect(),
        Value::Array(entries) => entries
            .iter()
            .map(|entry| MidRow {
                coin: match first_present(entry, &["coin", "symbol"]) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                },
                mid: first_present(entry, &["mid", "px", "price"])
                    .map(as_f64)
                    .unwrap_or(0.0),
            })
            .collect(),
        _ => Vec::new(),
    };

    rows.retain(|row| has_perp_suffix(&row.coin));
    rows.sort_by(|a, b| {
        a.coin
            .to_lowercase()
            .cmp(&b.coin.to_lowercase())
            .then_with(|| a.coin.cmp(&b.coin))
    });
    rows
}
