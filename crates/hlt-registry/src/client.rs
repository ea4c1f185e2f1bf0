//! HTTP client for the info endpoint.
//!
//! Every query is a POST of `{"type": ...}` to `<root>/info`. Coin names are
//! translated at this boundary: requests strip `-PERP`, and `allMids` keys
//! come back with it.

use crate::error::{RegistryError, RegistryResult};
use async_trait::async_trait;
use hlt_core::{display_symbol, EnvironmentConfig, InfoApi, SdkError, SdkResult, Symbol};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Request body for the info endpoint.
#[derive(Debug, Serialize)]
struct InfoRequest<'a> {
    #[serde(rename = "type")]
    request_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    coin: Option<&'a str>,
}

impl<'a> InfoRequest<'a> {
    fn plain(request_type: &'static str) -> Self {
        Self {
            request_type,
            user: None,
            coin: None,
        }
    }

    fn for_user(request_type: &'static str, user: &'a str) -> Self {
        Self {
            user: Some(user),
            ..Self::plain(request_type)
        }
    }

    fn for_coin(request_type: &'static str, coin: &'a str) -> Self {
        Self {
            coin: Some(coin),
            ..Self::plain(request_type)
        }
    }
}

/// Info endpoint client.
pub struct InfoClient {
    client: Client,
    info_url: String,
}

impl InfoClient {
    /// Create a client for an explicit info URL.
    pub fn new(info_url: impl Into<String>, timeout: Duration) -> RegistryResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            info_url: info_url.into(),
        })
    }

    /// Create a client for the validated testnet info endpoint.
    pub fn from_config(config: &EnvironmentConfig, timeout: Duration) -> RegistryResult<Self> {
        Self::new(config.info_url(), timeout)
    }

    pub fn info_url(&self) -> &str {
        &self.info_url
    }

    async fn post(&self, request: &InfoRequest<'_>) -> SdkResult<Value> {
        debug!(url = %self.info_url, request_type = request.request_type, "Info request");

        let response = self
            .client
            .post(&self.info_url)
            .json(request)
            .send()
            .await
            .map_err(|e| SdkError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SdkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SdkError::Decode(format!("{}: {e}", request.request_type)))
    }
}

/// Re-key an `allMids` map with display symbols.
fn with_display_symbols(mids: Value) -> Value {
    match mids {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(coin, mid)| (display_symbol(&coin), mid))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

#[async_trait]
impl InfoApi for InfoClient {
    async fn meta(&self) -> SdkResult<Value> {
        info!(url = %self.info_url, "Fetching meta");
        self.post(&InfoRequest::plain("meta")).await
    }

    async fn open_orders(&self, user: &str) -> SdkResult<Value> {
        self.post(&InfoRequest::for_user("openOrders", user)).await
    }

    async fn l2_book(&self, symbol: &Symbol) -> SdkResult<Value> {
        self.post(&InfoRequest::for_coin("l2Book", symbol.coin()))
            .await
    }

    async fn all_mids(&self) -> SdkResult<Value> {
        let mids = self.post(&InfoRequest::plain("allMids")).await?;
        Ok(with_display_symbols(mids))
    }

    async fn clearinghouse_state(&self, user: &str) -> SdkResult<Value> {
        self.post(&InfoRequest::for_user("clearinghouseState", user))
            .await
    }
}
