/// SSE subscriber gateway.
///
/// One long-lived `text/event-stream` response per subscriber. A spawned
/// task performs the handshake, forwards bus events in arrival order, and
/// heartbeats every 30s; the handler side is just a channel drained into
/// the response. A failed send means the client went away - the task
/// unsubscribes from the bus and exits without touching shared state.
use axum::extract::State;
use axum::http::header;
use axum::response::sse::{Event, Sse};
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::get;
use axum::Router;
use futures_util::StreamExt;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};

use crate::arguments::is_debug_stream_enabled;
use crate::bus::MonitorEvent;
use crate::helpers::now_ms;
use crate::logger::{log, LogTag};
use crate::monitor::{TokenMonitor, MAX_HISTORY};
use crate::webserver::state::AppState;

/// Most-recent records included in the initial snapshot.
const INITIAL_SNAPSHOT_LIMIT: usize = 30;
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// Outbound queue between the subscriber task and the response body.
const OUTBOUND_BUFFER: usize = 64;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/stream", get(stream_handler))
}

async fn stream_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (tx, mut rx) = mpsc::channel::<Event>(OUTBOUND_BUFFER);

    let monitor = state.monitor.clone();
    tokio::spawn(async move {
        run_subscriber(monitor, tx).await;
    });

    let stream =
        futures_util::stream::poll_fn(move |cx| rx.poll_recv(cx)).map(Ok::<_, Infallible>);

    (
        AppendHeaders([
            (header::CACHE_CONTROL, "no-cache"),
            (header::HeaderName::from_static("x-accel-buffering"), "no"),
        ]),
        Sse::new(stream),
    )
}

async fn run_subscriber(monitor: Arc<TokenMonitor>, tx: mpsc::Sender<Event>) {
    // 1. Handshake
    let status = if monitor.is_connected() { "connected" } else { "connecting" };
    if !send(&tx, "connected", json!({"status": status, "timestamp": now_ms()})).await {
        return;
    }

    // 2. First subscriber boots the pipeline
    if !monitor.is_running() {
        monitor.start();
    }

    // Subscribe before snapshotting so no event falls into the gap
    let bus = monitor.bus();
    let (subscriber_id, mut events) = bus.subscribe().await;
    if is_debug_stream_enabled() {
        log(
            LogTag::Stream,
            "DEBUG",
            &format!("SSE subscriber {} connected", subscriber_id),
        );
    }

    // 3. Replay: immediately when history is ready, otherwise forward the
    // loading progress and snapshot at historyLoaded
    let mut initial_sent = false;
    if monitor.is_initial_load_complete() {
        initial_sent = send_initial(&monitor, &tx).await;
        if !initial_sent {
            bus.unsubscribe(subscriber_id).await;
            return;
        }
    }

    let mut heartbeat = interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // the first tick is immediate

    // 4-7. Live forwarding until the client goes away
    loop {
        let delivered = tokio::select! {
            event = events.recv() => match event {
                Some(MonitorEvent::LoadingHistory { count }) if !initial_sent => {
                    send(&tx, "loading", json!({"status": "loading_history", "count": count}))
                        .await
                }
                Some(MonitorEvent::HistoryLoaded { .. }) if !initial_sent => {
                    initial_sent = send_initial(&monitor, &tx).await;
                    initial_sent
                }
                Some(MonitorEvent::TokenPassed(record)) => {
                    send(&tx, "token", json!({"token": record, "type": "passed"})).await
                }
                Some(MonitorEvent::TokenFiltered(record)) => {
                    send(&tx, "token", json!({"token": record, "type": "filtered"})).await
                }
                Some(MonitorEvent::Connected) => {
                    send(&tx, "status", json!({"status": "connected"})).await
                }
                Some(MonitorEvent::Disconnected) => {
                    send(&tx, "status", json!({"status": "disconnected"})).await
                }
                Some(MonitorEvent::Stopped) => false,
                // duplicate notifications and internal errors are not
                // part of the stream contract
                Some(_) => true,
                None => false,
            },
            _ = heartbeat.tick() => {
                send(
                    &tx,
                    "heartbeat",
                    json!({"timestamp": now_ms(), "stats": monitor.stats()}),
                )
                .await
            }
        };

        if !delivered {
            break;
        }
    }

    bus.unsubscribe(subscriber_id).await;
    if is_debug_stream_enabled() {
        log(
            LogTag::Stream,
            "DEBUG",
            &format!("SSE subscriber {} disconnected", subscriber_id),
        );
    }
}

/// `initial` snapshot followed by `loaded`. Returns false when the client
/// is gone.
async fn send_initial(monitor: &Arc<TokenMonitor>, tx: &mpsc::Sender<Event>) -> bool {
    let history = monitor.snapshot(MAX_HISTORY);
    let count = history.len();
    let tokens: Vec<_> = history.into_iter().take(INITIAL_SNAPSHOT_LIMIT).collect();

    if !send(
        tx,
        "initial",
        json!({"tokens": tokens, "stats": monitor.stats()}),
    )
    .await
    {
        return false;
    }
    send(
        tx,
        "loaded",
        json!({"status": "history_loaded", "count": count}),
    )
    .await
}

async fn send(tx: &mpsc::Sender<Event>, name: &str, payload: serde_json::Value) -> bool {
    tx.send(Event::default().event(name).data(payload.to_string()))
        .await
        .is_ok()
}
