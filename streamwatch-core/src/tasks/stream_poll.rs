// streamwatch-core/src/tasks/stream_poll.rs

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use streamwatch_common::traits::platform_traits::PlatformAdapter;

use crate::services::stream_tracker::{StreamTracker, TrackOutcome};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Counts from one pass over a platform's records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub checked: usize,
    pub notified: usize,
    pub errors: usize,
}

/// Polls every record of `adapter`'s platform once, sequentially.
///
/// A failing record is logged and skipped; the rest of the pass still runs.
pub async fn poll_once(adapter: &dyn PlatformAdapter, tracker: &StreamTracker) -> PollSummary {
    let platform = adapter.platform();
    let records = tracker.registry().all(platform).await;
    let mut summary = PollSummary::default();

    for record in records {
        summary.checked += 1;
        match tracker.track(adapter, &record).await {
            Ok(TrackOutcome::Notified(report)) => {
                summary.notified += 1;
                if !report.all_delivered() {
                    warn!(
                        "{}: announced with {} failed sink(s)",
                        record.key(),
                        report.failed.len()
                    );
                }
            }
            Ok(_) => {}
            Err(e) => {
                summary.errors += 1;
                warn!("Failed to poll {}: {}", record.key(), e);
            }
        }
    }

    debug!(
        "{} poll done: checked={} notified={} errors={}",
        platform, summary.checked, summary.notified, summary.errors
    );
    summary
}

/// Spawns the periodic poller for one platform.
///
/// The first pass runs immediately. Records are polled one at a time, so a
/// slow adapter delays the rest of that platform's pass (bounded by the
/// tracker's adapter timeout). Late ticks are delayed rather than bunched.
/// The task exits once `shutdown_rx` reads `true`.
pub fn spawn_stream_poll_task(
    adapter: Arc<dyn PlatformAdapter>,
    tracker: Arc<StreamTracker>,
    every: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let platform = adapter.platform();
        info!("Starting {} poller (every {:?})", platform, every);

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    poll_once(adapter.as_ref(), &tracker).await;
                }
                res = shutdown_rx.changed() => {
                    if res.is_err() {
                        error!("{} poller lost its shutdown channel; stopping", platform);
                        break;
                    }
                }
            }
        }

        info!("{} poller stopped", platform);
    })
}
