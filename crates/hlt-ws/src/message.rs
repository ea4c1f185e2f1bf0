//! WebSocket message types.

use hlt_core::display_symbol;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Channel name for mid price updates.
pub const ALL_MIDS_CHANNEL: &str = "allMids";

/// `{"type": "allMids"}`
pub fn all_mids_subscription() -> Value {
    json!({ "type": ALL_MIDS_CHANNEL })
}

/// Outgoing request to WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsRequest {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Value>,
}

impl WsRequest {
    pub fn ping() -> Self {
        Self {
            method: "ping".to_string(),
            subscription: None,
        }
    }

    pub fn subscribe(subscription: Value) -> Self {
        Self {
            method: "subscribe".to_string(),
            subscription: Some(subscription),
        }
    }

    pub fn unsubscribe(subscription: Value) -> Self {
        Self {
            method: "unsubscribe".to_string(),
            subscription: Some(subscription),
        }
    }
}

/// Incoming WebSocket message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WsMessage {
    /// `{"channel": "pong"}`
    Pong(PongMessage),
    /// Everything else carries a `data` field.
    Channel(ChannelMessage),
}

impl WsMessage {
    pub fn is_pong(&self) -> bool {
        matches!(self, Self::Pong(p) if p.channel == "pong")
    }

    pub fn channel(&self) -> &str {
        match self {
            Self::Pong(p) => &p.channel,
            Self::Channel(c) => &c.channel,
        }
    }

    /// Update payload if this is an allMids message, with display symbols.
    pub fn into_all_mids(self) -> Option<Value> {
        match self {
            Self::Channel(c) if c.channel == ALL_MIDS_CHANNEL => Some(with_display_symbols(c.data)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub channel: String,
    pub data: Value,
}

/// Uses deny_unknown_fields to distinguish from ChannelMessage in the untagged enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PongMessage {
    pub channel: String,
}

/// Re-key `data.mids` with display symbols (`BTC` -> `BTC-PERP`).
fn with_display_symbols(mut data: Value) -> Value {
    if let Some(mids) = data.get_mut("mids").and_then(Value::as_object_mut) {
        let rekeyed: Map<String, Value> = std::mem::take(mids)
            .into_iter()
            .map(|(coin, mid)| (display_symbol(&coin), mid))
            .collect();
        *mids = rekeyed;
    }
    data
}
