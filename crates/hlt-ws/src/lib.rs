//! WebSocket client for the allMids feed.
//!
//! One connection per subscription: connect, subscribe to `allMids`, keep the
//! socket alive with application-level pings, and forward each update to a
//! channel until the handle is unsubscribed. There is no reconnection; a
//! dropped socket ends the subscription.

pub mod connection;
pub mod error;
pub mod message;

pub use connection::{AllMidsSubscriber, AllMidsSubscription, SubscriberConfig, MIN_PING_INTERVAL};
pub use error::{WsError, WsResult};
pub use message::{all_mids_subscription, ChannelMessage, PongMessage, WsMessage, WsRequest};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any `wss://` connection is made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
