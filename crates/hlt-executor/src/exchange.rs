//! Signed order submission to the exchange endpoint.

use crate::error::{ExecutorError, ExecutorResult};
use crate::signer::{Action, KeyManager, OrderWire, SignatureWire, Signer, SigningInput};
use async_trait::async_trait;
use chrono::Utc;
use hlt_core::{EnvironmentConfig, ExchangeApi, OrderRequest, SdkError, SdkResult};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// POST body for `/exchange`.
#[derive(Debug, Serialize)]
pub struct ExchangeRequest {
    pub action: Action,
    pub nonce: u64,
    pub signature: SignatureWire,
    #[serde(rename = "vaultAddress", skip_serializing_if = "Option::is_none")]
    pub vault_address: Option<String>,
}

/// Exchange client holding the signing key.
pub struct ExchangeClient {
    client: Client,
    exchange_url: String,
    signer: Signer,
}

impl ExchangeClient {
    pub fn new(
        exchange_url: impl Into<String>,
        key_manager: KeyManager,
        timeout: Duration,
    ) -> ExecutorResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExecutorError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            exchange_url: exchange_url.into(),
            signer: Signer::new(key_manager),
        })
    }

    /// Client for the configured testnet exchange, or `None` without a credential.
    pub fn from_config(
        config: &EnvironmentConfig,
        timeout: Duration,
    ) -> ExecutorResult<Option<Self>> {
        let Some(credential) = config.signing_credential() else {
            return Ok(None);
        };
        let key_manager = KeyManager::from_credential(credential)?;
        info!(address = %key_manager.address(), "Loaded signing key");
        Self::new(config.exchange_url(), key_manager, timeout).map(Some)
    }

    /// Build and sign the request body for `order`.
    pub async fn signed_request(
        &self,
        order: &OrderRequest,
        nonce: u64,
    ) -> SdkResult<ExchangeRequest> {
        let action = Action::order(vec![OrderWire::from(order)]);
        let input = SigningInput {
            action,
            nonce,
            vault_address: None,
        };
        let signature = self
            .signer
            .sign_action(&input)
            .await
            .map_err(|e| SdkError::Signing(e.to_string()))?;

        Ok(ExchangeRequest {
            action: input.action,
            nonce,
            signature: SignatureWire::from(&signature),
            vault_address: None,
        })
    }
}

/// Map an exchange response to a result; `status: "err"` is a rejection.
fn check_response(body: Value) -> SdkResult<Value> {
    if body.get("status").and_then(Value::as_str) == Some("err") {
        let reason = match body.get("response") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => body.to_string(),
        };
        return Err(SdkError::Rejected(reason));
    }
    Ok(body)
}

#[async_trait]
impl ExchangeApi for ExchangeClient {
    async fn place_order(&self, order: &OrderRequest) -> SdkResult<Value> {
        let nonce = Utc::now().timestamp_millis() as u64;
        let request = self.signed_request(order, nonce).await?;

        info!(
            coin = %order.coin,
            asset = order.asset,
            is_buy = order.is_buy,
            nonce,
            "Sending order to testnet"
        );

        let response = self
            .client
            .post(&self.exchange_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SdkError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Exchange returned error status");
            return Err(SdkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SdkError::Decode(e.to_string()))?;
        check_response(body)
    }
}
