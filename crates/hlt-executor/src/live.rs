//! Live market data session.
//!
//! Two independent feeds share one session:
//! - the allMids push subscription, appended to a bounded [`LiveEventLog`]
//! - a mid price snapshot refreshed by polling `all_mids`
//!
//! Each feed owns its own state behind its own lock. Locks are only held for
//! synchronous updates, never across an await.

use crate::error::{ActionError, ActionResult};
use hlt_core::{EnvironmentGuard, EventPage, InfoApi, LiveEventLog, Subscription, SubscriptionApi};
use hlt_registry::MidSnapshot;
use hlt_telemetry::Metrics;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default snapshot refresh period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Shortest accepted refresh period; shorter values are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

const SINK_CAPACITY: usize = 256;

pub const MSG_CONNECTING: &str = "Connecting to Hyperliquid testnet WebSocket...";
pub const MSG_CONNECTED: &str = "✅ Connected! Receiving live market data...";
pub const MSG_DISCONNECTING: &str = "Disconnecting...";
pub const MSG_DISCONNECTED: &str = "✅ Disconnected";
pub const MSG_DISCONNECT_FAILED: &str = "❌ Error during disconnect";

struct Connection {
    subscription: Box<dyn Subscription>,
    forwarder: JoinHandle<()>,
}

struct Poller {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Session state as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatus {
    pub connected: bool,
    pub polling: bool,
    pub events: usize,
    pub last_error: Option<String>,
}

pub struct LiveSession {
    guard: EnvironmentGuard,
    info: Arc<dyn InfoApi>,
    subscriptions: Arc<dyn SubscriptionApi>,
    events: Arc<RwLock<LiveEventLog>>,
    snapshot: Arc<RwLock<Option<MidSnapshot>>>,
    last_error: Arc<RwLock<Option<String>>>,
    connection: tokio::sync::Mutex<Option<Connection>>,
    poller: Mutex<Option<Poller>>,
    poll_interval: Duration,
}

impl LiveSession {
    pub fn new(
        guard: EnvironmentGuard,
        info: Arc<dyn InfoApi>,
        subscriptions: Arc<dyn SubscriptionApi>,
    ) -> Self {
        Self {
            guard,
            info,
            subscriptions,
            events: Arc::new(RwLock::new(LiveEventLog::new())),
            snapshot: Arc::new(RwLock::new(None)),
            last_error: Arc::new(RwLock::new(None)),
            connection: tokio::sync::Mutex::new(None),
            poller: Mutex::new(None),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        if poll_interval < MIN_POLL_INTERVAL {
            warn!(?poll_interval, "Poll interval too short, using minimum");
        }
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Start the allMids subscription. No-op when already connected.
    pub async fn connect(&self) -> ActionResult<()> {
        let mut connection = self.connection.lock().await;
        if connection.is_some() {
            debug!("Live subscription already connected");
            return Ok(());
        }
        self.guard.check()?;

        self.events.write().clear();
        *self.last_error.write() = None;
        self.events.write().push_text(MSG_CONNECTING);
        info!("Connecting live allMids subscription");

        let (tx, rx) = mpsc::channel(SINK_CAPACITY);
        match self.subscriptions.subscribe_all_mids(tx).await {
            Ok(subscription) => {
                let forwarder = tokio::spawn(forward_events(rx, Arc::clone(&self.events)));
                *connection = Some(Connection {
                    subscription,
                    forwarder,
                });
                self.events.write().push_text(MSG_CONNECTED);
                Metrics::live_connected(true);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Live subscription failed");
                self.events
                    .write()
                    .push_text(format!("❌ Connection failed: {e}"));
                *self.last_error.write() = Some(format!("Connection failed: {e}"));
                Err(ActionError::transport("connect", e))
            }
        }
    }

    /// Release the subscription. The event log is kept.
    pub async fn disconnect(&self) -> ActionResult<()> {
        let Some(mut current) = self.connection.lock().await.take() else {
            return Ok(());
        };

        self.events.write().push_text(MSG_DISCONNECTING);
        let result = current.subscription.unsubscribe().await;
        current.forwarder.abort();
        let _ = current.forwarder.await;
        Metrics::live_connected(false);

        match result {
            Ok(()) => {
                info!("Live subscription closed");
                self.events.write().push_text(MSG_DISCONNECTED);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Unsubscribe failed");
                self.events.write().push_text(MSG_DISCONNECT_FAILED);
                Err(ActionError::transport("disconnect", e))
            }
        }
    }

    pub fn clear_events(&self) {
        self.events.write().clear();
    }

    pub fn events_page(&self, page: usize) -> EventPage {
        self.events.read().page(page)
    }

    /// Fetch a snapshot now and refresh it every poll interval.
    /// No-op when polling is already running.
    pub async fn start_polling(&self) -> ActionResult<()> {
        self.guard.check()?;
        {
            let mut poller = self.poller.lock();
            if poller.is_some() {
                debug!("Mid price polling already running");
                return Ok(());
            }

            let token = CancellationToken::new();
            let task = tokio::spawn(poll_loop(
                Arc::clone(&self.info),
                Arc::clone(&self.snapshot),
                Arc::clone(&self.last_error),
                self.poll_interval,
                token.clone(),
            ));
            *poller = Some(Poller { token, task });
        }

        info!(interval_secs = self.poll_interval.as_secs(), "Started mid price polling");
        refresh_snapshot(self.info.as_ref(), &self.snapshot, &self.last_error).await;
        Ok(())
    }

    pub fn stop_polling(&self) {
        if let Some(poller) = self.poller.lock().take() {
            poller.token.cancel();
            poller.task.abort();
            info!("Stopped mid price polling");
        }
    }

    pub fn snapshot(&self) -> Option<MidSnapshot> {
        self.snapshot.read().clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.lock().is_some()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    pub async fn status(&self) -> LiveStatus {
        LiveStatus {
            connected: self.is_connected().await,
            polling: self.is_polling(),
            events: self.events.read().len(),
            last_error: self.last_error(),
        }
    }

    /// Tear down both feeds.
    pub async fn shutdown(&self) {
        self.stop_polling();
        if let Err(e) = self.disconnect().await {
            warn!(error = %e, "Error while shutting down live session");
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.get_mut().take() {
            poller.token.cancel();
            poller.task.abort();
        }
        if let Some(connection) = self.connection.get_mut().take() {
            // Dropping the subscription handle cancels its read loop.
            connection.forwarder.abort();
            Metrics::live_connected(false);
        }
    }
}

async fn forward_events(mut rx: mpsc::Receiver<Value>, events: Arc<RwLock<LiveEventLog>>) {
    while let Some(data) = rx.recv().await {
        events.write().push_text(format!("Market Update: {data}"));
        Metrics::live_event();
    }
    debug!("Live event forwarder finished");
}

async fn poll_loop(
    info: Arc<dyn InfoApi>,
    snapshot: Arc<RwLock<Option<MidSnapshot>>>,
    last_error: Arc<RwLock<Option<String>>>,
    period: Duration,
    token: CancellationToken,
) {
    // The first fetch is done by the caller.
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            _ = ticker.tick() => {
                refresh_snapshot(info.as_ref(), &snapshot, &last_error).await;
            }
        }
    }
}

async fn refresh_snapshot(
    info: &dyn InfoApi,
    snapshot: &RwLock<Option<MidSnapshot>>,
    last_error: &RwLock<Option<String>>,
) {
    match info.all_mids().await {
        Ok(raw) => {
            let next = MidSnapshot::from_raw(&raw);
            debug!(rows = next.rows.len(), "Refreshed mid price snapshot");
            *snapshot.write() = Some(next);
            Metrics::mid_poll(true);
        }
        Err(e) => {
            warn!(error = %e, "Mid price poll failed");
            *last_error.write() = Some(format!("Failed to fetch mid prices: {e}"));
            Metrics::mid_poll(false);
        }
    }
}
