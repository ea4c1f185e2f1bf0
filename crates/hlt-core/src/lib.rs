//! Core domain types for the Hyperliquid testnet demo client.
//!
//! This crate provides the pieces every other crate builds on:
//! - `EnvironmentConfig` / `EnvironmentGuard`: the testnet-only safety guard
//! - `Symbol`: perpetual symbol naming (`BTC-PERP`)
//! - `OrderRequest`: the order payload shown before anything is sent
//! - `LiveEventLog`: bounded log of subscription notifications
//! - `InfoApi`, `ExchangeApi`, `SubscriptionApi`: the exchange SDK surface,
//!   injected into executors instead of being looked up globally

pub mod environment;
pub mod error;
pub mod event_log;
pub mod order;
pub mod sdk;
pub mod symbol;

pub use environment::{
    EnvSource, EnvironmentConfig, EnvironmentGuard, EnvironmentSummary, FormDefaults,
    SigningCredential, DEFAULT_API_ROOT, DEFAULT_WS_URL, ZERO_ADDRESS,
};
pub use error::{ConfigError, SdkError, SdkResult};
pub use event_log::{
    EventPage, LiveEvent, LiveEventLog, EVENT_DISPLAY_LIMIT, EVENT_PAGE_SIZE, LIVE_EVENT_CAPACITY,
};
pub use order::{LimitOrderType, OrderRequest, OrderType, TimeInForce};
pub use sdk::{ExchangeApi, InfoApi, Subscription, SubscriptionApi};
pub use symbol::{display_symbol, has_perp_suffix, Symbol, PERP_SUFFIX};
