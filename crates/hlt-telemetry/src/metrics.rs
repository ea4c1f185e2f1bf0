//! Prometheus metrics.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. Registration only fails
//! on duplicate metric names, which is a programming error, and it happens
//! during static initialization.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_int_counter, register_int_gauge, CounterVec, Encoder,
    IntCounter, IntGauge, TextEncoder,
};

/// User actions by outcome.
/// Labels: action (open_orders/positions/orderbook/place_order), outcome (ok or error kind)
pub static ACTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hlt_actions_total",
        "Executor actions by outcome",
        &["action", "outcome"]
    )
    .unwrap()
});

/// Order submissions by mode.
/// Labels: mode (dry_run_no_credential/dry_run_toggle/submitted)
pub static ORDERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("hlt_orders_total", "Order payloads built by mode", &["mode"]).unwrap()
});

/// Live subscription events appended to the event log.
pub static LIVE_EVENTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "hlt_live_events_total",
        "Market update events received on the live subscription"
    )
    .unwrap()
});

/// Live subscription state (1 = connected).
pub static LIVE_CONNECTED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "hlt_live_connected",
        "Live allMids subscription state (1=connected)"
    )
    .unwrap()
});

/// Mid price snapshot polls by outcome.
pub static MID_POLLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hlt_mid_polls_total",
        "allMids snapshot polls by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Metric recording helpers.
pub struct Metrics;

impl Metrics {
    pub fn action(action: &str, outcome: &str) {
        ACTIONS_TOTAL.with_label_values(&[action, outcome]).inc();
    }

    pub fn order(mode: &str) {
        ORDERS_TOTAL.with_label_values(&[mode]).inc();
    }

    pub fn live_event() {
        LIVE_EVENTS_TOTAL.inc();
    }

    pub fn live_connected(connected: bool) {
        LIVE_CONNECTED.set(i64::from(connected));
    }

    pub fn mid_poll(ok: bool) {
        MID_POLLS_TOTAL
            .with_label_values(&[if ok { "ok" } else { "error" }])
            .inc();
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
