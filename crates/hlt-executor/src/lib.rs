//! Query executors, order signing and the live market data session.
//!
//! - `Executor`: guarded info queries and order placement, one per panel
//! - `ExchangeClient`: signs `order` actions and posts them to `/exchange`
//! - `LiveSession`: allMids subscription log plus polled mid price snapshot

pub mod error;
pub mod exchange;
pub mod executor;
pub mod live;
pub mod signer;

pub use error::{ActionError, ActionResult, ExecutorError, ExecutorResult};
pub use exchange::{ExchangeClient, ExchangeRequest};
pub use executor::{
    DryRunReason, Executor, OrderForm, OrderOutcome, OrderStatus, PositionsView,
    ACTION_OPEN_ORDERS, ACTION_ORDERBOOK, ACTION_PLACE_ORDER, ACTION_POSITIONS,
};
pub use live::{LiveSession, LiveStatus, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
pub use signer::{KeyError, KeyManager, Signer, SignerError};
