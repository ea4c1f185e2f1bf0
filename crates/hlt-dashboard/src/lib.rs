//! hlt-dashboard - HTTP front end for the Hyperliquid testnet demo.
//!
//! Each panel of the demo is an endpoint group backed by its own executor:
//!
//! ```text
//! GET  /api/environment          guard result + form defaults
//! POST /api/info/open-orders     {address}
//! POST /api/positions            {address}   -> {raw, positions}
//! POST /api/orderbook            {marketId}
//! POST /api/order                {marketId, price, size, isBuy, dryRun, tif}
//! POST /api/live/connect|disconnect|clear
//! GET  /api/live/events?page=N
//! POST /api/live/polling/start|stop
//! GET  /api/live/snapshot
//! GET  /metrics                  Prometheus text format
//! ```
//!
//! Responses use the `{ok, result | error}` envelope. Failed actions still
//! return HTTP 200.

mod config;
mod error;
mod server;
mod state;
mod types;

pub use config::DashboardConfig;
pub use error::{DashboardError, DashboardResult};
pub use server::{create_router, run_server};
pub use state::{Clients, DashboardState};
pub use types::{AddressRequest, ApiResponse, EventsQuery, LiveEventsView, MarketRequest, SnapshotView};
