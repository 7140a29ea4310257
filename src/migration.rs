/// Migration source - persistent upstream WebSocket subscription.
///
/// Owns the single connection to the pump.fun migration stream. The
/// connection loop walks Disconnected -> Connecting -> Open; on open it
/// sends the subscription frame and starts a 30s liveness ping. Every error
/// or close backs off `RECONNECT_BASE x min(attempts, 5)` (capped at 25s),
/// and after MAX_ATTEMPTS consecutive failures the loop cools down for 60s
/// before resetting the counter. Listener fan-out goes through a broadcast
/// channel, so a misbehaving listener can never reach the socket loop.
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};
use tokio::time::{interval, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::arguments::is_debug_websocket_enabled;
use crate::helpers::now_ms;
use crate::logger::{log, LogTag};
use crate::sol_price;
use crate::types::MigrationEvent;

const RECONNECT_BASE: Duration = Duration::from_secs(5);
const MAX_BACKOFF_MULTIPLIER: u32 = 5;
const MAX_ATTEMPTS: u32 = 10;
const COOLDOWN: Duration = Duration::from_secs(60);
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Broadcast capacity; lagging listeners skip, they are never waited on.
const LISTENER_CAPACITY: usize = 256;

/// What the source announces to its listeners.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    Migration(MigrationEvent),
    Connected,
    Disconnected,
}

pub struct MigrationSource {
    ws_url: String,
    events: broadcast::Sender<SourceEvent>,
    shutdown: Arc<Notify>,
}

impl MigrationSource {
    pub fn new(ws_url: String) -> Arc<Self> {
        let (events, _) = broadcast::channel(LISTENER_CAPACITY);
        Arc::new(Self {
            ws_url,
            events,
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Register a listener. Safe to call before or after `start`.
    pub fn subscribe(&self) -> broadcast::Receiver<SourceEvent> {
        self.events.subscribe()
    }

    /// Spawn the connection loop.
    pub fn start(self: &Arc<Self>) {
        let source = Arc::clone(self);
        tokio::spawn(async move {
            source.run().await;
        });
    }

    /// Ask the connection loop to exit.
    pub fn stop(&self) {
        self.shutdown.notify_waiters();
        let _ = self.events.send(SourceEvent::Disconnected);
    }

    async fn run(self: Arc<Self>) {
        let mut attempts: u32 = 0;

        loop {
            log(
                LogTag::Websocket,
                "CONNECT",
                &format!("Connecting to migration stream: {}", self.ws_url),
            );

            match self.run_connection().await {
                ConnectionOutcome::Shutdown => {
                    log(LogTag::Websocket, "INFO", "Migration source stopped");
                    return;
                }
                // Opening a connection resets the failure counter, so a
                // session that subscribed successfully restarts the backoff
                ConnectionOutcome::Closed { opened: true } => attempts = 1,
                ConnectionOutcome::Closed { opened: false } => attempts += 1,
            }

            let _ = self.events.send(SourceEvent::Disconnected);

            if attempts >= MAX_ATTEMPTS {
                log(
                    LogTag::Websocket,
                    "WARN",
                    &format!(
                        "Migration stream failed {} times, cooling down for {}s",
                        attempts,
                        COOLDOWN.as_secs()
                    ),
                );
                if self.wait_or_shutdown(COOLDOWN).await {
                    return;
                }
                attempts = 0;
                continue;
            }

            let delay = RECONNECT_BASE * attempts.clamp(1, MAX_BACKOFF_MULTIPLIER);
            log(
                LogTag::Websocket,
                "RECONNECT",
                &format!(
                    "Migration stream disconnected, retrying in {}s (attempt {})",
                    delay.as_secs(),
                    attempts
                ),
            );
            if self.wait_or_shutdown(delay).await {
                return;
            }
        }
    }

    /// One connection lifetime: dial, subscribe, pump frames until error,
    /// close, or shutdown.
    async fn run_connection(&self) -> ConnectionOutcome {
        let (ws_stream, _) = match connect_async(&self.ws_url).await {
            Ok(connected) => connected,
            Err(e) => {
                log(
                    LogTag::Websocket,
                    "WARN",
                    &format!("Migration stream dial failed: {}", e),
                );
                return ConnectionOutcome::Closed { opened: false };
            }
        };

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        let subscribe_frame = serde_json::json!({"method": "subscribeMigration"}).to_string();
        if let Err(e) = ws_sender.send(Message::Text(subscribe_frame)).await {
            log(
                LogTag::Websocket,
                "WARN",
                &format!("Failed to send subscription frame: {}", e),
            );
            return ConnectionOutcome::Closed { opened: false };
        }

        log(LogTag::Websocket, "SUBSCRIBE", "Subscribed to migration stream");
        let _ = self.events.send(SourceEvent::Connected);

        let mut ping = interval(PING_INTERVAL);
        ping.tick().await; // first tick fires immediately, skip it

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    let _ = ws_sender.send(Message::Close(None)).await;
                    return ConnectionOutcome::Shutdown;
                }
                _ = ping.tick() => {
                    if let Err(e) = ws_sender.send(Message::Ping(Vec::new())).await {
                        log(
                            LogTag::Websocket,
                            "WARN",
                            &format!("Liveness ping failed: {}", e),
                        );
                        return ConnectionOutcome::Closed { opened: true };
                    }
                }
                message = ws_receiver.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_frame(&text).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            log(LogTag::Websocket, "INFO", "Migration stream closed by server");
                            return ConnectionOutcome::Closed { opened: true };
                        }
                        Some(Ok(_)) => {
                            // Binary / ping / pong frames need no handling
                        }
                        Some(Err(e)) => {
                            log(
                                LogTag::Websocket,
                                "WARN",
                                &format!("Migration stream error: {}", e),
                            );
                            return ConnectionOutcome::Closed { opened: true };
                        }
                        None => {
                            return ConnectionOutcome::Closed { opened: true };
                        }
                    }
                }
            }
        }
    }

    async fn handle_frame(&self, text: &str) {
        let frame: Value = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(_) => {
                if is_debug_websocket_enabled() {
                    log(
                        LogTag::Websocket,
                        "DEBUG",
                        &format!(
                            "Unparseable frame: {}",
                            crate::helpers::safe_truncate(text, 120)
                        ),
                    );
                }
                return;
            }
        };

        match frame.get("txType").and_then(|v| v.as_str()) {
            Some("migration") => {}
            // buy/sell trade frames and subscription acks are not our concern
            _ => return,
        }

        let mint = match frame.get("mint").and_then(|v| v.as_str()) {
            Some(mint) if !mint.is_empty() => mint.to_string(),
            _ => return,
        };

        // The stream reports market cap in SOL; convert at receipt time and
        // leave it unset when the oracle is down (never zero)
        let market_cap = match frame.get("marketCapSol").and_then(|v| v.as_f64()) {
            Some(mc_sol) => sol_price::sol_to_usd(mc_sol).await,
            None => None,
        };

        let event = MigrationEvent {
            mint,
            signature: frame
                .get("signature")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            name: frame
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            symbol: frame
                .get("symbol")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            uri: frame
                .get("uri")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            pool: frame
                .get("pool")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            timestamp: now_ms(),
            market_cap,
            liquidity: None,
            creator: frame
                .get("creator")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        };

        log(
            LogTag::Websocket,
            "INFO",
            &format!(
                "Migration detected: mint={} symbol={}",
                event.mint,
                if event.symbol.is_empty() { "?" } else { &event.symbol }
            ),
        );

        let _ = self.events.send(SourceEvent::Migration(event));
    }

    async fn wait_or_shutdown(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.shutdown.notified() => true,
            _ = tokio::time::sleep(delay) => false,
        }
    }
}

enum ConnectionOutcome {
    Shutdown,
    Closed { opened: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        // base 5s, multiplier min(attempts, 5), cap 25s
        for (attempts, expected_secs) in [(1u32, 5u64), (2, 10), (5, 25), (9, 25)] {
            let delay = RECONNECT_BASE * attempts.clamp(1, MAX_BACKOFF_MULTIPLIER);
            assert_eq!(delay.as_secs(), expected_secs, "attempts={}", attempts);
        }
    }

    #[tokio::test]
    async fn test_subscribe_before_start() {
        let source = MigrationSource::new("wss://example.invalid/ws".to_string());
        let mut rx = source.subscribe();
        source.stop();
        match rx.recv().await {
            Ok(SourceEvent::Disconnected) => {}
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
