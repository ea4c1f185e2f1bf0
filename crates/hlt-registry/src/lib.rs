//! Market resolution and response normalization.
//!
//! - `InfoClient`: HTTP implementation of `InfoApi` against the `/info` endpoint
//! - `MarketResolver`: market id -> `-PERP` symbol, backed by a lazily built directory
//! - `normalize_positions` / `normalize_mids`: reduce varying response shapes to one

pub mod client;
pub mod error;
pub mod mids;
pub mod positions;
pub mod resolver;

pub use client::InfoClient;
pub use error::{RegistryError, RegistryResult};
pub use mids::{normalize_mids, MidRow, MidSnapshot};
pub use positions::{normalize_positions, NormalizedPosition};
pub use resolver::{MarketDirectory, MarketResolver};
