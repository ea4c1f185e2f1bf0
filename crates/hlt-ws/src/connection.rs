//! allMids subscription over a single WebSocket connection.

use crate::error::{WsError, WsResult};
use crate::message::{all_mids_subscription, WsMessage, WsRequest};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use hlt_core::{SdkResult, Subscription, SubscriptionApi};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Shortest accepted ping interval; shorter values are raised to this.
pub const MIN_PING_INTERVAL: Duration = Duration::from_millis(10);

/// Subscriber configuration.
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// WebSocket URL.
    pub url: String,
    /// Interval between application-level pings.
    pub ping_interval: Duration,
}

impl SubscriberConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_ping_interval(mut self, ping_interval: Duration) -> Self {
        self.ping_interval = ping_interval;
        self
    }

    /// Ping period actually used by the read loop.
    pub fn ping_period(&self) -> Duration {
        self.ping_interval.max(MIN_PING_INTERVAL)
    }
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            ping_interval: Duration::from_secs(30),
        }
    }
}

/// Opens one connection per allMids subscription.
#[derive(Debug, Clone)]
pub struct AllMidsSubscriber {
    config: SubscriberConfig,
}

impl AllMidsSubscriber {
    pub fn new(config: SubscriberConfig) -> Self {
        Self { config }
    }

    /// Connect, send the subscribe request and spawn the read loop.
    pub async fn subscribe(&self, sink: mpsc::Sender<Value>) -> WsResult<AllMidsSubscription> {
        info!(url = %self.config.url, "Connecting to WebSocket");

        let (ws_stream, _response) =
            connect_async_tls_with_config(&self.config.url, None, true, None)
                .await
                .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
        let (mut write, read) = ws_stream.split();

        let request = serde_json::to_string(&WsRequest::subscribe(all_mids_subscription()))?;
        write.send(Message::Text(request)).await?;
        info!("Subscribed to allMids");

        let token = CancellationToken::new();
        let task = tokio::spawn(run_loop(
            write,
            read,
            sink,
            token.clone(),
            self.config.ping_period(),
        ));

        Ok(AllMidsSubscription {
            token,
            task: Some(task),
        })
    }
}

#[async_trait]
impl SubscriptionApi for AllMidsSubscriber {
    async fn subscribe_all_mids(
        &self,
        sink: mpsc::Sender<Value>,
    ) -> SdkResult<Box<dyn Subscription>> {
        let subscription = self.subscribe(sink).await?;
        Ok(Box::new(subscription))
    }
}

/// Handle for a running allMids subscription.
///
/// Dropping the handle cancels the read loop without waiting for it.
pub struct AllMidsSubscription {
    token: CancellationToken,
    task: Option<JoinHandle<WsResult<()>>>,
}

impl AllMidsSubscription {
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

#[async_trait]
impl Subscription for AllMidsSubscription {
    async fn unsubscribe(&mut self) -> SdkResult<()> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        self.token.cancel();

        match task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                // The socket already failed; the subscription is gone either way.
                warn!(error = %e, "allMids loop ended with error");
                Ok(())
            }
            Err(e) => Err(WsError::SendFailed(format!("read loop panicked: {e}")).into()),
        }
    }
}

impl Drop for AllMidsSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_loop(
    mut write: SplitSink<WsStream, Message>,
    mut read: SplitStream<WsStream>,
    sink: mpsc::Sender<Value>,
    token: CancellationToken,
    ping_interval: Duration,
) -> WsResult<()> {
    let mut ping = tokio::time::interval_at(tokio::time::Instant::now() + ping_interval, ping_interval);

    loop {
        tokio::select! {
            biased;

            () = token.cancelled() => {
                info!("Unsubscribing from allMids");
                let request = serde_json::to_string(&WsRequest::unsubscribe(all_mids_subscription()))?;
                if let Err(e) = write.send(Message::Text(request)).await {
                    warn!(?e, "Failed to send unsubscribe");
                }
                if let Err(e) = write.send(Message::Close(None)).await {
                    warn!(?e, "Failed to send Close frame");
                }
                return Ok(());
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let parsed: WsMessage = match serde_json::from_str(&text) {
                            Ok(parsed) => parsed,
                            Err(e) => {
                                debug!(error = %e, "Ignoring unparseable message");
                                continue;
                            }
                        };
                        if parsed.is_pong() {
                            debug!("Received pong");
                            continue;
                        }
                        let Some(data) = parsed.into_all_mids() else {
                            continue;
                        };
                        tokio::select! {
                            biased;
                            () = token.cancelled() => continue,
                            sent = sink.send(data) => {
                                if sent.is_err() {
                                    debug!("Receiver dropped, ending subscription");
                                    let _ = write.send(Message::Close(None)).await;
                                    return Ok(());
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (f.code.into(), f.reason.to_string()))
                            .unwrap_or((1000, "Normal close".to_string()));
                        warn!(code, %reason, "WebSocket closed by server");
                        return Err(WsError::ConnectionClosed { code, reason });
                    }
                    Some(Err(e)) => {
                        error!(?e, "WebSocket read error");
                        return Err(e.into());
                    }
                    None => {
                        warn!("WebSocket stream ended");
                        return Ok(());
                    }
                    _ => {}
                }
            }

            _ = ping.tick() => {
                let request = serde_json::to_string(&WsRequest::ping())?;
                write.send(Message::Text(request)).await?;
                debug!("Sent ping");
            }
        }
    }
}
