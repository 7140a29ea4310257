/// Monitor event bus - bounded fan-out to stream subscribers.
///
/// Each subscriber gets its own bounded queue; `try_send` drops events for
/// a full queue instead of stalling the publisher. A subscriber that falls
/// behind relies on the next `initial` snapshot after reconnecting.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::arguments::is_debug_monitor_enabled;
use crate::logger::{log, LogTag};
use crate::types::TokenRecord;

/// Default per-subscriber queue depth.
pub const SUBSCRIBER_BUFFER: usize = 64;

/// Everything the monitor announces.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    LoadingHistory { count: usize },
    HistoryLoaded { count: usize },
    TokenPassed(Arc<TokenRecord>),
    TokenFiltered(Arc<TokenRecord>),
    TokenAnalyzed(Arc<TokenRecord>),
    Connected,
    Disconnected,
    Error(String),
    Stopped,
}

pub type SubscriberId = u64;

pub struct EventBus {
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<MonitorEvent>>>,
    next_id: AtomicU64,
    buffer_size: usize,
}

impl EventBus {
    pub fn new(buffer_size: usize) -> Arc<Self> {
        Arc::new(Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer_size,
        })
    }

    /// Register a new subscriber queue.
    pub async fn subscribe(&self) -> (SubscriberId, mpsc::Receiver<MonitorEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(self.buffer_size);
        self.subscribers.write().await.insert(id, tx);

        if is_debug_monitor_enabled() {
            log(
                LogTag::Monitor,
                "DEBUG",
                &format!(
                    "Bus subscriber {} registered (active={})",
                    id,
                    self.subscribers.read().await.len()
                ),
            );
        }

        (id, rx)
    }

    /// Drop a subscriber queue.
    pub async fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.write().await.remove(&id);
        if is_debug_monitor_enabled() {
            log(
                LogTag::Monitor,
                "DEBUG",
                &format!(
                    "Bus subscriber {} unregistered (active={})",
                    id,
                    self.subscribers.read().await.len()
                ),
            );
        }
    }

    /// Deliver an event to every live subscriber, dropping on full queues.
    pub async fn publish(&self, event: MonitorEvent) {
        let subscribers = self.subscribers.read().await;
        if subscribers.is_empty() {
            return;
        }

        let mut dropped = 0usize;
        for (id, sender) in subscribers.iter() {
            match sender.try_send(event.clone()) {
                Ok(_) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    dropped += 1;
                    if is_debug_monitor_enabled() {
                        log(
                            LogTag::Monitor,
                            "DEBUG",
                            &format!("Bus event dropped for subscriber {} (queue full)", id),
                        );
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Disconnected subscriber; cleaned up on unsubscribe
                    dropped += 1;
                }
            }
        }

        if dropped > 0 && is_debug_monitor_enabled() {
            log(
                LogTag::Monitor,
                "DEBUG",
                &format!("Bus publish dropped {} deliveries", dropped),
            );
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_and_unsubscribe() {
        let bus = EventBus::new(8);
        let (id1, _rx1) = bus.subscribe().await;
        let (id2, _rx2) = bus.subscribe().await;
        assert_eq!(bus.subscriber_count().await, 2);
        assert_ne!(id1, id2);

        bus.unsubscribe(id1).await;
        assert_eq!(bus.subscriber_count().await, 1);
        bus.unsubscribe(id2).await;
        assert_eq!(bus.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = EventBus::new(8);
        let (_id, mut rx) = bus.subscribe().await;

        bus.publish(MonitorEvent::Connected).await;
        match rx.recv().await {
            Some(MonitorEvent::Connected) => {}
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_subscriber_drops_not_blocks() {
        let bus = EventBus::new(2);
        let (_id, mut rx) = bus.subscribe().await;

        // Fill the queue past capacity; publish must not block
        for _ in 0..5 {
            bus.publish(MonitorEvent::Disconnected).await;
        }

        // Only the buffered events are delivered
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 2);
    }
}
