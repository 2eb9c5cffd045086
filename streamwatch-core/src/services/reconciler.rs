//! Online/offline state machine for one tracked channel.
//!
//! [`reconcile`] is pure: it looks at the previous record and a fresh
//! observation and says what the record should become and whether that is
//! worth announcing. Persisting and dispatching is the caller's job.
//!
//! A record is *live* while it holds a session id. Live records keep
//! `stopped_at == 0 || stopped_at < started_at`; offline ones keep
//! `stopped_at >= started_at`.

use std::collections::HashMap;

use streamwatch_common::models::platform::Platform;
use streamwatch_common::models::stream::{Observation, StreamRecord};

/// Default grace period for a re-issued session id with the same category.
pub const DEFAULT_RECENT_WINDOW_SECS: i64 = 30 * 60;

/// Where to put `stopped_at` when the clock can't place it after the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopClamp {
    /// `stopped_at = started_at`
    AtStart,
    /// `stopped_at = started_at + 1`
    AfterStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilePolicy {
    pub recent_window_secs: i64,
    pub stop_clamp: StopClamp,
}

impl ReconcilePolicy {
    pub fn for_platform(platform: Platform) -> Self {
        let stop_clamp = match platform {
            Platform::Legacy => StopClamp::AtStart,
            Platform::Twitch | Platform::YouTube => StopClamp::AfterStart,
        };
        Self {
            recent_window_secs: DEFAULT_RECENT_WINDOW_SECS,
            stop_clamp,
        }
    }

    pub fn with_recent_window(mut self, secs: i64) -> Self {
        self.recent_window_secs = secs;
        self
    }
}

/// Per-platform policies, falling back to [`ReconcilePolicy::for_platform`].
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    overrides: HashMap<Platform, ReconcilePolicy>,
}

impl PolicyTable {
    pub fn set(&mut self, platform: Platform, policy: ReconcilePolicy) {
        self.overrides.insert(platform, policy);
    }

    pub fn get(&self, platform: Platform) -> ReconcilePolicy {
        self.overrides
            .get(&platform)
            .copied()
            .unwrap_or_else(|| ReconcilePolicy::for_platform(platform))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Was offline, still offline.
    Idle,
    /// Same session, same category.
    Steady,
    WentOffline,
    /// New session id shortly after the last start with the same category:
    /// a reconnect, not a new broadcast.
    Continued,
    NewSession,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// `None` means nothing changed and nothing should be written.
    pub record: Option<StreamRecord>,
    pub notify: bool,
    pub transition: Transition,
}

impl Reconciliation {
    fn unchanged(transition: Transition) -> Self {
        Self { record: None, notify: false, transition }
    }

    fn write(record: StreamRecord, transition: Transition, notify: bool) -> Self {
        Self { record: Some(record), notify, transition }
    }
}

pub fn reconcile(
    prev: &StreamRecord,
    obs: &Observation,
    now: i64,
    policy: &ReconcilePolicy,
) -> Reconciliation {
    if !obs.is_live() {
        if !prev.is_live() {
            return Reconciliation::unchanged(Transition::Idle);
        }

        let mut next = prev.clone();
        next.session_id.clear();
        if next.stopped_at < next.started_at {
            next.stopped_at = now;
        }
        // Clock skew: the platform's start time is ahead of our clock.
        if next.stopped_at < next.started_at {
            next.stopped_at = match policy.stop_clamp {
                StopClamp::AtStart => next.started_at,
                StopClamp::AfterStart => next.started_at + 1,
            };
        }
        return Reconciliation::write(next, Transition::WentOffline, false);
    }

    let same_session = obs.session_id == prev.session_id;
    let same_category = obs.category == prev.category;

    if same_session && same_category {
        return Reconciliation::unchanged(Transition::Steady);
    }

    let mut next = prev.clone();

    let recent = prev.started_at > 0 && now - prev.started_at <= policy.recent_window_secs;
    if !same_session && same_category && recent {
        next.session_id = obs.session_id.clone();
        clamp_live_stop(&mut next);
        return Reconciliation::write(next, Transition::Continued, false);
    }

    next.session_id = obs.session_id.clone();
    next.category = obs.category.clone();
    next.started_at = obs.started_at.unwrap_or(now);
    clamp_live_stop(&mut next);
    Reconciliation::write(next, Transition::NewSession, true)
}

/// A live record must not carry a stop marker at or after its start.
fn clamp_live_stop(rec: &mut StreamRecord) {
    if rec.stopped_at != 0 && rec.stopped_at >= rec.started_at {
        rec.stopped_at = rec.started_at - 1;
    }
}
