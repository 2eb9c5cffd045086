// File: streamwatch-core/src/services/stream_tracker.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::time::timeout;
use tracing::{debug, info};

use streamwatch_common::models::notification::StreamNotification;
use streamwatch_common::models::platform::Platform;
use streamwatch_common::models::stream::{Observation, StreamRecord};
use streamwatch_common::traits::platform_traits::PlatformAdapter;

use crate::Error;
use crate::eventbus::{EventBus, TrackerEvent};
use crate::services::notification_dispatcher::{DispatchReport, NotificationDispatcher};
use crate::services::reconciler::{reconcile, PolicyTable, Reconciliation, Transition};
use crate::services::stream_registry::StreamRegistry;

pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Upper bound on a single adapter call; expiry counts as a transient
    /// error for that record.
    pub adapter_timeout: Duration,
    /// Base URL used to build legacy channel links.
    pub legacy_base_url: String,
    pub policies: PolicyTable,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
            legacy_base_url: String::new(),
            policies: PolicyTable::default(),
        }
    }
}

/// What one `track` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// Nothing changed (idle or steady live).
    Unchanged,
    WentOffline,
    /// Reconnect inside the recent window; record updated quietly.
    Continued,
    Notified(DispatchReport),
    /// The channel was removed while we were asking the platform.
    Removed,
}

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Runs one observation through the state machine and acts on the result.
pub struct StreamTracker {
    registry: Arc<StreamRegistry>,
    dispatcher: Arc<NotificationDispatcher>,
    event_bus: Option<Arc<EventBus>>,
    config: TrackerConfig,
    clock: Clock,
}

impl StreamTracker {
    pub fn new(
        registry: Arc<StreamRegistry>,
        dispatcher: Arc<NotificationDispatcher>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            event_bus: None,
            config,
            clock: Arc::new(|| Utc::now().timestamp()),
        }
    }

    /// Also publish offline transitions on `bus`.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Replace the wall clock (unix seconds), for tests.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Polls `record`'s channel once and reconciles the answer.
    ///
    /// An `Err` means the adapter failed or timed out; the record is left
    /// untouched and will be retried on the next tick.
    pub async fn track(&self, adapter: &dyn PlatformAdapter, record: &StreamRecord) -> Result<TrackOutcome, Error> {
        let key = record.key();

        let obs = timeout(self.config.adapter_timeout, adapter.observe(&record.service_id)).await??;
        let now = (self.clock)();
        let policy = self.config.policies.get(record.platform);

        let result = self
            .registry
            .update_with(&key, |current| {
                let r = reconcile(current, &obs, now, &policy);
                (r.record.clone(), r)
            })
            .await;

        let Some(Reconciliation { record: updated, transition, .. }) = result else {
            debug!("{} was removed during its poll; dropping observation", key);
            return Ok(TrackOutcome::Removed);
        };

        match (transition, updated) {
            (Transition::WentOffline, updated) => {
                let stopped_at = updated.map(|r| r.stopped_at).unwrap_or(now);
                info!("{} went offline", key);
                if let Some(bus) = &self.event_bus {
                    bus.publish(TrackerEvent::StreamOffline { key, stopped_at }).await;
                }
                Ok(TrackOutcome::WentOffline)
            }
            (Transition::Continued, _) => {
                info!("{} resumed with session '{}' inside the recent window; not announcing", key, obs.session_id);
                Ok(TrackOutcome::Continued)
            }
            (Transition::NewSession, Some(updated)) => {
                info!(
                    "{} started a new session '{}' ({})",
                    key, updated.session_id, updated.category
                );
                let notification = self.build_notification(&updated, &obs, now);
                let report = self.dispatcher.dispatch(&notification).await;
                Ok(TrackOutcome::Notified(report))
            }
            (transition, _) => {
                debug!("{}: no change ({:?})", key, transition);
                Ok(TrackOutcome::Unchanged)
            }
        }
    }

    fn build_notification(&self, record: &StreamRecord, obs: &Observation, now: i64) -> StreamNotification {
        let platform: Platform = record.platform;
        StreamNotification {
            platform,
            platform_display_color: platform.display_color(),
            member_id: record.member_id.clone(),
            username: obs
                .display_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| record.service_id.clone()),
            user_avatar_url: obs.avatar_url.clone(),
            channel_url: platform.channel_url(&record.service_id, &self.config.legacy_base_url),
            category: record.category.clone(),
            description: obs.title.clone().unwrap_or_default(),
            timestamp: Utc.timestamp_opt(now, 0).single().unwrap_or_else(Utc::now),
        }
    }
}
