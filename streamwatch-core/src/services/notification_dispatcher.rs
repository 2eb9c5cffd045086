// File: streamwatch-core/src/services/notification_dispatcher.rs

use std::sync::Arc;
use tracing::{info, warn};

use streamwatch_common::models::notification::StreamNotification;
use streamwatch_common::traits::notification_traits::NotificationSink;

/// Outcome of one fan-out, by sink name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    /// `(sink name, error message)`
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sends every notification to every registered sink, once each.
///
/// A failing sink is logged and skipped; it never stops the others and
/// never surfaces to the caller as an error.
#[derive(Default)]
pub struct NotificationDispatcher {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sink: Arc<dyn NotificationSink>) {
        info!("Registered notification sink '{}'", sink.name());
        self.sinks.push(sink);
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.register(sink);
        self
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub async fn dispatch(&self, notification: &StreamNotification) -> DispatchReport {
        let mut report = DispatchReport::default();

        for sink in &self.sinks {
            match sink.send(notification).await {
                Ok(()) => report.delivered.push(sink.name().to_string()),
                Err(e) => {
                    warn!(
                        "Notification sink '{}' failed for {}:{}: {}",
                        sink.name(),
                        notification.platform,
                        notification.username,
                        e
                    );
                    report.failed.push((sink.name().to_string(), e.to_string()));
                }
            }
        }

        report
    }
}
