//! L1 action signing.
//!
//! Two stages:
//! 1. `action_hash` = keccak256(msgpack(action) || nonce_be || vault_tag)
//! 2. EIP-712 signature over the phantom agent `{source, connectionId}`
//!
//! This client only talks to testnet, so the phantom agent source is always
//! `"b"`.

use alloy::primitives::{keccak256, Address, PrimitiveSignature, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as AlloySigner;
use alloy::sol;
use alloy::sol_types::eip712_domain;
use alloy::sol_types::SolStruct;
use hlt_core::{OrderRequest, SigningCredential, TimeInForce};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use zeroize::Zeroizing;

// =============================================================================
// KeyManager
// =============================================================================

/// Holds the signing key derived from the configured credential.
///
/// Never log key material.
pub struct KeyManager {
    signer: PrivateKeySigner,
}

impl KeyManager {
    /// Parse a hex private key (with or without `0x`).
    pub fn from_credential(credential: &SigningCredential) -> Result<Self, KeyError> {
        let trimmed = credential.expose().trim();
        let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let secret_bytes = Zeroizing::new(hex::decode(hex_str)?);

        let signer = PrivateKeySigner::from_slice(&secret_bytes)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        Ok(Self { signer })
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

/// Key management errors.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Failed to decode hex: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),
}

// =============================================================================
// Wire Format Types
// =============================================================================

/// L1 `order` action.
///
/// Field order is part of the msgpack hash: `type`, `orders`, `grouping`.
#[derive(Debug, Clone, Serialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,
    pub orders: Vec<OrderWire>,
    /// "na" for standalone orders.
    pub grouping: String,
}

impl Action {
    pub fn order(orders: Vec<OrderWire>) -> Self {
        Self {
            action_type: "order".to_string(),
            orders,
            grouping: "na".to_string(),
        }
    }
}

/// Single order on the wire.
///
/// `Option` fields must be skipped when `None`; serializing them as `nil`
/// changes the hash.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWire {
    #[serde(rename = "a")]
    pub asset: u32,
    #[serde(rename = "b")]
    pub is_buy: bool,
    #[serde(rename = "p")]
    pub limit_px: String,
    #[serde(rename = "s")]
    pub sz: String,
    #[serde(rename = "r")]
    pub reduce_only: bool,
    #[serde(rename = "t")]
    pub order_type: OrderTypeWire,
    #[serde(rename = "c", skip_serializing_if = "Option::is_none")]
    pub cloid: Option<String>,
}

impl From<&OrderRequest> for OrderWire {
    fn from(order: &OrderRequest) -> Self {
        Self {
            asset: order.asset,
            is_buy: order.is_buy,
            limit_px: decimal_to_wire(order.limit_px),
            sz: decimal_to_wire(order.sz),
            reduce_only: order.reduce_only,
            order_type: OrderTypeWire::limit(order.order_type.limit.tif),
            cloid: None,
        }
    }
}

/// Decimal as the exchange expects it: no trailing zeros, no exponent.
pub fn decimal_to_wire(value: Decimal) -> String {
    value.normalize().to_string()
}

/// `{"limit": {"tif": "Gtc"|"Ioc"|"Alo"}}`
#[derive(Debug, Clone, Serialize)]
pub struct OrderTypeWire {
    pub limit: LimitWire,
}

#[derive(Debug, Clone, Serialize)]
pub struct LimitWire {
    pub tif: String,
}

impl OrderTypeWire {
    pub fn limit(tif: TimeInForce) -> Self {
        let tif = match tif {
            TimeInForce::Gtc => "Gtc",
            TimeInForce::Ioc => "Ioc",
            TimeInForce::Alo => "Alo",
        };
        Self {
            limit: LimitWire {
                tif: tif.to_string(),
            },
        }
    }
}

// =============================================================================
// SigningInput and action_hash
// =============================================================================

#[derive(Debug, Clone)]
pub struct SigningInput {
    pub action: Action,
    pub nonce: u64,
    /// None = personal account, Some = vault.
    pub vault_address: Option<Address>,
}

impl SigningInput {
    /// keccak256(msgpack(action) || nonce (8 bytes BE) || vault tag).
    ///
    /// The vault tag is `0x00` without a vault and `0x01 || address` with one.
    pub fn action_hash(&self) -> Result<B256, SignerError> {
        let mut data = rmp_serde::to_vec_named(&self.action)
            .map_err(|e| SignerError::SerializationFailed(e.to_string()))?;

        data.extend_from_slice(&self.nonce.to_be_bytes());

        match &self.vault_address {
            None => data.push(0x00),
            Some(addr) => {
                data.push(0x01);
                data.extend_from_slice(addr.as_slice());
            }
        }

        Ok(keccak256(&data))
    }
}

// =============================================================================
// PhantomAgent and EIP-712 Signing
// =============================================================================

pub const EIP712_DOMAIN_NAME: &str = "Exchange";
pub const EIP712_DOMAIN_VERSION: &str = "1";
pub const EIP712_CHAIN_ID: u64 = 1337;
pub const EIP712_VERIFYING_CONTRACT: Address = Address::ZERO;

/// Phantom agent source for testnet.
pub const TESTNET_SOURCE: &str = "b";

sol! {
    #[derive(Debug)]
    struct Agent {
        string source;
        bytes32 connectionId;
    }
}

/// EIP-712 signing target.
#[derive(Debug, Clone)]
pub struct PhantomAgent {
    pub source: String,
    pub connection_id: B256,
}

impl PhantomAgent {
    pub fn testnet(action_hash: B256) -> Self {
        Self {
            source: TESTNET_SOURCE.to_string(),
            connection_id: action_hash,
        }
    }

    pub async fn sign<S: AlloySigner + Send + Sync>(
        &self,
        signer: &S,
    ) -> Result<PrimitiveSignature, alloy::signers::Error> {
        let domain = eip712_domain! {
            name: EIP712_DOMAIN_NAME,
            version: EIP712_DOMAIN_VERSION,
            chain_id: EIP712_CHAIN_ID,
            verifying_contract: EIP712_VERIFYING_CONTRACT,
        };

        let agent = Agent {
            source: self.source.clone(),
            connectionId: self.connection_id,
        };

        let signing_hash = agent.eip712_signing_hash(&domain);
        signer.sign_hash(&signing_hash).await
    }
}

// =============================================================================
// Signer
// =============================================================================

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("Signing failed: {0}")]
    SigningFailed(#[from] alloy::signers::Error),

    #[error("Action serialization failed: {0}")]
    SerializationFailed(String),
}

/// Signature in the exchange's JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureWire {
    /// 0x-prefixed, 32 bytes.
    pub r: String,
    /// 0x-prefixed, 32 bytes.
    pub s: String,
    /// 27 or 28.
    pub v: u8,
}

impl From<&PrimitiveSignature> for SignatureWire {
    fn from(signature: &PrimitiveSignature) -> Self {
        Self {
            r: format!("0x{}", hex::encode(signature.r().to_be_bytes::<32>())),
            s: format!("0x{}", hex::encode(signature.s().to_be_bytes::<32>())),
            v: if signature.v() { 28 } else { 27 },
        }
    }
}

/// Signs L1 actions for testnet.
pub struct Signer {
    key_manager: KeyManager,
}

impl Signer {
    pub fn new(key_manager: KeyManager) -> Self {
        Self { key_manager }
    }

    pub async fn sign_action(&self, input: &SigningInput) -> Result<PrimitiveSignature, SignerError> {
        let action_hash = input.action_hash()?;
        let phantom_agent = PhantomAgent::testnet(action_hash);
        Ok(phantom_agent.sign(self.key_manager.signer()).await?)
    }

    pub fn address(&self) -> Address {
        self.key_manager.address()
    }
}

// =============================================================================
// Tests
// =============================================================================
