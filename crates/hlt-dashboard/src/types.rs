//! Dashboard API types.

use hlt_core::EventPage;
use hlt_executor::LiveStatus;
use hlt_registry::MidSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope for every `/api` response.
///
/// Action failures are reported with `ok: false` and HTTP 200 so the client
/// can show the message and stay usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn success<T: Serialize>(result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self {
                ok: true,
                result: Some(value),
                error: None,
            },
            Err(e) => Self::failure(format!("Failed to encode response: {e}")),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressRequest {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRequest {
    #[serde(default)]
    pub market_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsQuery {
    #[serde(default = "first_page")]
    pub page: usize,
}

fn first_page() -> usize {
    1
}

#[derive(Debug, Clone, Serialize)]
pub struct LiveEventsView {
    #[serde(flatten)]
    pub page: EventPage,
    pub status: LiveStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotView {
    pub snapshot: Option<MidSnapshot>,
    pub polling: bool,
    pub last_error: Option<String>,
}
