//! Prometheus metrics and structured logging.
//!
//! - `init_logging`: tracing subscriber on stderr, JSON in production
//! - `Metrics`: counters for user actions, orders and the live session

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
