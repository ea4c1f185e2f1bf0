//! Exchange SDK surface.
//!
//! Executors take these as `Arc<dyn ...>` so tests can substitute mocks and
//! no component reaches for a process-wide client.

use crate::error::{SdkError, SdkResult};
use crate::order::OrderRequest;
use crate::symbol::Symbol;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

/// Read-only info queries.
///
/// Position queries exist under several names across SDK versions. Clients
/// implement whichever they support; the rest report `SdkError::Unsupported`
/// so callers can walk a fallback chain.
#[async_trait]
pub trait InfoApi: Send + Sync {
    /// Perp metadata document (`{"type":"meta"}`).
    async fn meta(&self) -> SdkResult<Value>;

    async fn open_orders(&self, user: &str) -> SdkResult<Value>;

    async fn l2_book(&self, symbol: &Symbol) -> SdkResult<Value>;

    async fn all_mids(&self) -> SdkResult<Value>;

    async fn clearinghouse_state(&self, _user: &str) -> SdkResult<Value> {
        Err(SdkError::Unsupported("getClearinghouseState"))
    }

    async fn user_positions(&self, _user: &str) -> SdkResult<Value> {
        Err(SdkError::Unsupported("getUserPositions"))
    }

    async fn user_state(&self, _user: &str) -> SdkResult<Value> {
        Err(SdkError::Unsupported("userState"))
    }

    async fn get_user_state(&self, _user: &str) -> SdkResult<Value> {
        Err(SdkError::Unsupported("getUserState"))
    }

    /// Legacy orderbook query, used when `l2_book` is unsupported.
    async fn orderbook(&self, _symbol: &Symbol) -> SdkResult<Value> {
        Err(SdkError::Unsupported("getOrderbook"))
    }
}

/// Signed order submission.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    async fn place_order(&self, order: &OrderRequest) -> SdkResult<Value>;
}

/// Live subscription handle.
#[async_trait]
pub trait Subscription: Send {
    /// Stop delivery. No message reaches the sink after this returns.
    /// Calling it again is a no-op.
    async fn unsubscribe(&mut self) -> SdkResult<()>;
}

/// Push subscriptions.
#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    /// Subscribe to all mid prices; each update's `data` is sent to `sink`.
    async fn subscribe_all_mids(
        &self,
        sink: mpsc::Sender<Value>,
    ) -> SdkResult<Box<dyn Subscription>>;
}
