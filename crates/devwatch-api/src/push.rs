//! Named-event push channel with auto-reconnect.
//!
//! Speaks a small framing over WebSocket text frames: every frame is a
//! JSON object `{"event": <name>, "data": <payload>}`. Inbound frames whose
//! `event` matches the configured name are surfaced as
//! [`ChannelEvent::Message`]; connection lifecycle changes are surfaced as
//! their own [`ChannelEvent`] variants so consumers can track connection
//! state separately from data.
//!
//! # Example
//!
//! ```rust,ignore
//! use devwatch_api::push::{PushChannel, ReconnectConfig, ChannelEvent};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let url = Url::parse("ws://127.0.0.1:8000/ws")?;
//! let mut channel = PushChannel::connect(url, "device_status", ReconnectConfig::default(), CancellationToken::new());
//!
//! while let Some(event) = channel.recv().await {
//!     if let ChannelEvent::Connected = event {
//!         channel.subscribe_devices(10);
//!     }
//! }
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

/// Default inbound event name carrying device payloads.
pub const DEFAULT_EVENT_NAME: &str = "device_status";

/// Outbound event announcing the desired device count.
pub const SUBSCRIBE_EVENT: &str = "subscribe_devices";

// ── Frames & events ──────────────────────────────────────────────────

/// Wire envelope for every frame in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl EventFrame {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// The `subscribe_devices {n}` announcement.
    pub fn subscribe_devices(count: u16) -> Self {
        Self::new(SUBSCRIBE_EVENT, serde_json::json!({ "n": count }))
    }
}

/// Everything the channel reports to its consumer, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A connection was established (first connect or reconnect).
    Connected,
    /// An established connection dropped.
    Disconnected { reason: String },
    /// A connection attempt failed.
    Error { message: String },
    /// Payload of an inbound frame with the configured event name.
    Message(serde_json::Value),
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for reconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum consecutive failed attempts before giving up. A successful
    /// connect resets the count. `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── PushChannel ──────────────────────────────────────────────────────

/// Handle to a running push channel.
///
/// The connection loop runs in a background task. Inbound events arrive
/// on an unbounded queue so nothing is coalesced or dropped; outbound
/// frames are written by the same task while a connection is up.
pub struct PushChannel {
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    outbound: mpsc::UnboundedSender<EventFrame>,
    cancel: CancellationToken,
}

impl PushChannel {
    /// Spawn the connection loop for `url`.
    ///
    /// Returns immediately; the first connection attempt happens in the
    /// background and is reported as [`ChannelEvent::Connected`] or
    /// [`ChannelEvent::Error`].
    pub fn connect(
        url: Url,
        event_name: impl Into<String>,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        let ctx = LoopContext {
            url,
            event_name: event_name.into(),
            reconnect,
            cancel: cancel.clone(),
            event_tx,
        };
        tokio::spawn(channel_loop(ctx, outbound_rx));

        Self {
            events,
            outbound,
            cancel,
        }
    }

    /// Receive the next channel event. `None` once the loop has exited.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    /// Queue an outbound frame. Frames queued while disconnected are
    /// discarded on the next connect; callers re-announce on
    /// [`ChannelEvent::Connected`].
    pub fn emit(&self, frame: EventFrame) -> bool {
        self.outbound.send(frame).is_ok()
    }

    /// Announce the desired device count.
    pub fn subscribe_devices(&self, count: u16) -> bool {
        self.emit(EventFrame::subscribe_devices(count))
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

struct LoopContext {
    url: Url,
    event_name: String,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
    event_tx: mpsc::UnboundedSender<ChannelEvent>,
}

impl LoopContext {
    fn send(&self, event: ChannelEvent) {
        // Receiver gone means the consumer is tearing down.
        let _ = self.event_tx.send(event);
    }
}

/// How a single established connection ended.
enum SessionEnd {
    Cancelled,
    Closed(String),
    Failed(String),
}

/// Main loop: connect → read/write → on drop, backoff → reconnect.
async fn channel_loop(ctx: LoopContext, mut outbound_rx: mpsc::UnboundedReceiver<EventFrame>) {
    let mut attempt: u32 = 0;

    loop {
        let connected = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => break,
            result = open(&ctx.url) => result,
        };

        let failed = match connected {
            Ok(stream) => {
                attempt = 0;

                // Frames queued while we were away were meant for a dead session.
                let mut stale = 0usize;
                while outbound_rx.try_recv().is_ok() {
                    stale += 1;
                }
                if stale > 0 {
                    tracing::debug!(stale, "dropping frames queued while disconnected");
                }

                ctx.send(ChannelEvent::Connected);
                match run_session(&ctx, stream, &mut outbound_rx).await {
                    SessionEnd::Cancelled => break,
                    SessionEnd::Closed(reason) => {
                        tracing::info!(%reason, "push channel closed, reconnecting");
                        ctx.send(ChannelEvent::Disconnected { reason });
                        false
                    }
                    SessionEnd::Failed(reason) => {
                        tracing::warn!(%reason, "push channel dropped");
                        ctx.send(ChannelEvent::Disconnected { reason });
                        true
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "push channel connect failed");
                ctx.send(ChannelEvent::Error {
                    message: e.to_string(),
                });
                true
            }
        };

        if !failed {
            continue;
        }

        if let Some(max) = ctx.reconnect.max_retries {
            if attempt >= max {
                tracing::error!(max_retries = max, "reconnection limit reached, giving up");
                break;
            }
        }

        let delay = calculate_backoff(attempt, &ctx.reconnect);
        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        attempt = attempt.saturating_add(1);
    }

    tracing::debug!("push channel loop exiting");
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn open(url: &Url) -> Result<WsStream, Error> {
    tracing::info!(url = %url, "connecting push channel");
    let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
    tracing::info!("push channel connected");
    Ok(stream)
}

/// Pump one established connection until it ends.
async fn run_session(
    ctx: &LoopContext,
    stream: WsStream,
    outbound_rx: &mut mpsc::UnboundedReceiver<EventFrame>,
) -> SessionEnd {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => {
                let _ = write.send(tungstenite::Message::Close(None)).await;
                return SessionEnd::Cancelled;
            }
            Some(frame) = outbound_rx.recv() => {
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(error = %e, event = %frame.event, "unserializable outbound frame");
                        continue;
                    }
                };
                tracing::debug!(event = %frame.event, "emitting frame");
                if let Err(e) = write.send(tungstenite::Message::text(text)).await {
                    return SessionEnd::Failed(e.to_string());
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        if let Some(payload) = parse_frame(&text, &ctx.event_name) {
                            ctx.send(ChannelEvent::Message(payload));
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite queues the pong; it goes out with the next write/flush.
                        tracing::trace!("push channel ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        let reason = frame.map_or_else(
                            || "closed by server".to_owned(),
                            |cf| format!("code {}: {}", cf.code, cf.reason),
                        );
                        return SessionEnd::Closed(reason);
                    }
                    Some(Err(e)) => return SessionEnd::Failed(e.to_string()),
                    None => return SessionEnd::Closed("stream ended".into()),
                    Some(Ok(_)) => {
                        // Binary, Pong, raw Frame: not part of the protocol.
                    }
                }
            }
        }
    }
}

// ── Frame parsing ────────────────────────────────────────────────────

/// Decode a text frame and return its payload if the event name matches.
pub(crate) fn parse_frame(text: &str, event_name: &str) -> Option<serde_json::Value> {
    let frame: EventFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring malformed push frame");
            return None;
        }
    };

    if frame.event == event_name {
        Some(frame.data)
    } else {
        tracing::trace!(event = %frame.event, "ignoring push frame for other event");
        None
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 ± 0.25)`
///
/// The jitter is deterministic per attempt number; it only needs to spread
/// reconnects from many dashboards, not to be unpredictable.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap, clippy::as_conversions)]
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = attempt.min(30) as i32;
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_exponentially() {
        let config = ReconnectConfig::default();

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);

        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d10 = calculate_backoff(10, &config);
        assert!(
            d10 <= Duration::from_millis(12_500),
            "delay at attempt 10 ({d10:?}) should be capped near max_delay"
        );
    }

    #[test]
    fn backoff_survives_huge_attempt_counts() {
        let d = calculate_backoff(u32::MAX, &ReconnectConfig::default());
        assert!(d <= Duration::from_millis(37_500));
    }

    #[test]
    fn subscribe_frame_shape() {
        let frame = EventFrame::subscribe_devices(25);
        let text = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            text,
            serde_json::json!({ "event": "subscribe_devices", "data": { "n": 25 } })
        );
    }

    #[test]
    fn parse_frame_matching_event() {
        let text = r#"{"event":"device_status","data":{"id":3,"status":"Down"}}"#;
        let payload = parse_frame(text, DEFAULT_EVENT_NAME).unwrap();
        assert_eq!(payload["id"], 3);
        assert_eq!(payload["status"], "Down");
    }

    #[test]
    fn parse_frame_other_event_is_ignored() {
        let text = r#"{"event":"heartbeat","data":{}}"#;
        assert!(parse_frame(text, DEFAULT_EVENT_NAME).is_none());
    }

    #[test]
    fn parse_frame_custom_event_name() {
        let text = r#"{"event":"lab_devices","data":[]}"#;
        assert_eq!(
            parse_frame(text, "lab_devices"),
            Some(serde_json::json!([]))
        );
    }

    #[test]
    fn parse_frame_without_data_yields_null() {
        let text = r#"{"event":"device_status"}"#;
        assert_eq!(
            parse_frame(text, DEFAULT_EVENT_NAME),
            Some(serde_json::Value::Null)
        );
    }

    #[test]
    fn parse_frame_malformed_json() {
        assert!(parse_frame("not json at all", DEFAULT_EVENT_NAME).is_none());
    }
}
