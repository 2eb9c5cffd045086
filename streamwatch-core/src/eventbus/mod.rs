//! src/eventbus/mod.rs
//!
//! Provides an in-process event bus that supports guaranteed delivery
//! to multiple subscribers via bounded MPSC queues, plus a notification
//! sink that forwards go-live announcements onto it.

use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex};

use streamwatch_common::models::notification::StreamNotification;
use streamwatch_common::models::stream::StreamKey;
use streamwatch_common::traits::notification_traits::NotificationSink;
use crate::Error;

/// Things the tracker tells the rest of the process about.
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// A new session was announced.
    StreamLive(StreamNotification),

    /// A tracked channel went offline.
    StreamOffline {
        key: StreamKey,
        stopped_at: i64,
    },
}

impl TrackerEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            TrackerEvent::StreamLive(_) => "stream.live",
            TrackerEvent::StreamOffline { .. } => "stream.offline",
        }
    }
}

/// Each subscriber gets its own `mpsc::Sender<TrackerEvent>` for guaranteed delivery.
///
/// - If the subscriber’s channel buffer fills, `publish` will await
///   until there's space (backpressure).
/// - If the subscriber has dropped the `Receiver`, sending to it fails and
///   is ignored.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<TrackerEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber’s buffer.
const DEFAULT_BUFFER_SIZE: usize = 1024;

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    /// Flips the shutdown flag every poller watches.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which events will be delivered.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<TrackerEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Publish an event to all subscribers.
    pub async fn publish(&self, event: TrackerEvent) {
        let senders = {
            let mut subs = self.subscribers.lock().await;
            subs.retain(|s| !s.is_closed());
            subs.clone()
        };
        for s in senders {
            let _ = s.send(event.clone()).await;
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Notification sink that republishes announcements on the bus.
pub struct EventBusNotifier {
    bus: Arc<EventBus>,
}

impl EventBusNotifier {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl NotificationSink for EventBusNotifier {
    fn name(&self) -> &str {
        "event-bus"
    }

    async fn send(&self, notification: &StreamNotification) -> Result<(), Error> {
        if self.bus.is_shutdown() {
            return Err(Error::Notify("event bus is shut down".into()));
        }
        self.bus.publish(TrackerEvent::StreamLive(notification.clone())).await;
        Ok(())
    }
}
