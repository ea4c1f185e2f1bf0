//! Hyperliquid testnet demo client.
//!
//! Modes:
//! - `info`: open orders for the configured address
//! - `order`: build (and optionally send) a limit order from the defaults
//! - `subs`: print allMids updates for a fixed window
//! - `serve`: run the HTTP dashboard

pub mod app;
pub mod config;
pub mod error;

pub use app::{select_mode, Application, Mode, USAGE};
pub use config::{AppConfig, DEFAULT_CONFIG_PATH};
pub use error::{AppError, AppResult};
