// tests/tracker_tests.rs
//
// End-to-end runs of poll -> reconcile -> persist -> dispatch against a real
// SQLite store.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use streamwatch_common::models::platform::Platform;
use streamwatch_common::models::stream::{Observation, StreamKey};
use streamwatch_core::{
    db::Database,
    eventbus::{EventBus, EventBusNotifier, TrackerEvent},
    platforms::{legacy::LegacyAdapter, slack::SlackWebhookNotifier, PlatformAdapter},
    repositories::{SqliteStreamStore, StreamStore},
    services::{NotificationDispatcher, StreamRegistry, StreamTracker, TrackOutcome, TrackerConfig},
    tasks::{poll_once, PollSummary},
    test_utils::FakeHttpClient,
    Error, HttpResponse,
};

/// Hands out queued observations in order; errors when the queue runs dry.
struct ScriptedAdapter {
    platform: Platform,
    script: Mutex<VecDeque<Result<Observation, Error>>>,
}

impl ScriptedAdapter {
    fn new(platform: Platform, script: Vec<Result<Observation, Error>>) -> Self {
        Self {
            platform,
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl PlatformAdapter for ScriptedAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn observe(&self, _service_id: &str) -> Result<Observation, Error> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Platform("script exhausted".into())))
    }
}

struct Harness {
    store: Arc<dyn StreamStore>,
    registry: Arc<StreamRegistry>,
    tracker: StreamTracker,
    bus: Arc<EventBus>,
    slack: Arc<FakeHttpClient>,
    clock: Arc<AtomicI64>,
}

async fn harness(slack_status: u16) -> Result<Harness, Error> {
    let db = Database::new("sqlite::memory:").await?;
    db.migrate().await?;
    let store: Arc<dyn StreamStore> = Arc::new(SqliteStreamStore::new(db.pool().clone()));
    let registry = Arc::new(StreamRegistry::load(store.clone()).await?);

    let bus = Arc::new(EventBus::new());
    let slack = Arc::new(FakeHttpClient::new());
    slack.respond("hooks.slack.test", HttpResponse::new(slack_status, "ok"));

    let dispatcher = NotificationDispatcher::new()
        .with_sink(Arc::new(SlackWebhookNotifier::new(slack.clone(), "https://hooks.slack.test/T000")))
        .with_sink(Arc::new(EventBusNotifier::new(bus.clone())));

    let clock = Arc::new(AtomicI64::new(0));
    let tick = clock.clone();
    let tracker = StreamTracker::new(
        registry.clone(),
        Arc::new(dispatcher),
        TrackerConfig {
            legacy_base_url: "https://legacy.example".into(),
            ..TrackerConfig::default()
        },
    )
    .with_event_bus(bus.clone())
    .with_clock(move || tick.load(Ordering::SeqCst));

    Ok(Harness { store, registry, tracker, bus, slack, clock })
}

/// Every persisted live record keeps its stop marker before its start.
async fn assert_persisted_invariant(store: &Arc<dyn StreamStore>) -> Result<(), Error> {
    for rec in store.load_all().await? {
        if rec.is_live() {
            assert!(
                rec.stopped_at == 0 || rec.stopped_at <= rec.started_at - 1,
                "{} violates the live invariant: started={} stopped={}",
                rec.key(),
                rec.started_at,
                rec.stopped_at
            );
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_full_lifecycle_announces_once_per_broadcast() -> Result<(), Error> {
    let h = harness(200).await?;
    let mut events = h.bus.subscribe(None).await;
    h.registry.add(Platform::Twitch, "afro", "7").await?;
    let key = StreamKey::new(Platform::Twitch, "afro");

    let adapter = ScriptedAdapter::new(
        Platform::Twitch,
        vec![
            Ok(Observation::live("s1", "A").started_at(1000).display_name("Afro")),
            Ok(Observation::live("s1", "A")),
            Ok(Observation::live("s2", "A")),
            Ok(Observation::offline()),
            Ok(Observation::offline()),
            Ok(Observation::live("s3", "A").display_name("Afro")),
        ],
    );

    // 1. first go-live
    h.clock.store(1010, Ordering::SeqCst);
    let rec = h.registry.get(&key).await.unwrap();
    assert!(matches!(h.tracker.track(&adapter, &rec).await?, TrackOutcome::Notified(_)));
    assert_persisted_invariant(&h.store).await?;

    // 2. steady state
    h.clock.store(1300, Ordering::SeqCst);
    let rec = h.registry.get(&key).await.unwrap();
    assert_eq!(h.tracker.track(&adapter, &rec).await?, TrackOutcome::Unchanged);

    // 3. reconnect ten minutes in
    h.clock.store(1600, Ordering::SeqCst);
    let rec = h.registry.get(&key).await.unwrap();
    assert_eq!(h.tracker.track(&adapter, &rec).await?, TrackOutcome::Continued);
    let rec = h.registry.get(&key).await.unwrap();
    assert_eq!((rec.session_id.as_str(), rec.started_at), ("s2", 1000));
    assert_persisted_invariant(&h.store).await?;

    // 4. offline, twice
    h.clock.store(5000, Ordering::SeqCst);
    assert_eq!(h.tracker.track(&adapter, &rec).await?, TrackOutcome::WentOffline);
    let rec = h.registry.get(&key).await.unwrap();
    assert_eq!(rec.session_id, "");
    assert_eq!(rec.stopped_at, 5000);
    assert_eq!(h.tracker.track(&adapter, &rec).await?, TrackOutcome::Unchanged);

    // 5. next broadcast, long after
    h.clock.store(20_000, Ordering::SeqCst);
    let rec = h.registry.get(&key).await.unwrap();
    assert!(matches!(h.tracker.track(&adapter, &rec).await?, TrackOutcome::Notified(_)));
    let rec = h.registry.get(&key).await.unwrap();
    assert_eq!(rec.started_at, 20_000);
    assert_eq!(rec.stopped_at, 5000);
    assert_persisted_invariant(&h.store).await?;

    // Two announcements on each sink, one offline event in between.
    assert_eq!(h.slack.posts().len(), 2);
    let kinds: Vec<&'static str> = [
        events.recv().await.unwrap(),
        events.recv().await.unwrap(),
        events.recv().await.unwrap(),
    ]
    .iter()
    .map(|e| e.event_type())
    .collect();
    assert_eq!(kinds, vec!["stream.live", "stream.offline", "stream.live"]);
    Ok(())
}

#[tokio::test]
async fn test_new_session_outside_window_is_announced_with_category() -> Result<(), Error> {
    let h = harness(200).await?;
    let mut events = h.bus.subscribe(None).await;
    h.registry.add(Platform::Twitch, "afro", "7").await?;
    let key = StreamKey::new(Platform::Twitch, "afro");
    h.registry
        .update_with(&key, |cur| {
            let mut next = cur.clone();
            next.session_id = "s1".into();
            next.category = "A".into();
            next.started_at = 1000;
            (Some(next), ())
        })
        .await;

    h.clock.store(6000, Ordering::SeqCst);
    let adapter = ScriptedAdapter::new(Platform::Twitch, vec![Ok(Observation::live("s2", "A"))]);
    let rec = h.registry.get(&key).await.unwrap();
    h.tracker.track(&adapter, &rec).await?;

    let stored = h.store.load_all().await?;
    assert_eq!(stored[0].started_at, 6000);
    assert_eq!(stored[0].session_id, "s2");

    match events.recv().await {
        Some(TrackerEvent::StreamLive(n)) => {
            assert_eq!(n.category, "A");
            assert_eq!(n.member_id, "7");
        }
        other => panic!("expected StreamLive, got {:?}", other),
    }
    let posts = h.slack.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].1["attachments"][0]["fields"][0]["value"], "A");
    Ok(())
}

#[tokio::test]
async fn test_failing_sink_does_not_block_others() -> Result<(), Error> {
    let h = harness(500).await?;
    let mut events = h.bus.subscribe(None).await;
    h.registry.add(Platform::YouTube, "UC1", "3").await?;

    h.clock.store(10_000, Ordering::SeqCst);
    let adapter = ScriptedAdapter::new(Platform::YouTube, vec![Ok(Observation::live("vid1", "20"))]);
    let rec = h.registry.get(&StreamKey::new(Platform::YouTube, "UC1")).await.unwrap();

    match h.tracker.track(&adapter, &rec).await? {
        TrackOutcome::Notified(report) => {
            assert_eq!(report.delivered, vec!["event-bus".to_string()]);
            assert_eq!(report.failed.len(), 1);
            assert_eq!(report.failed[0].0, "slack-webhook");
        }
        other => panic!("expected Notified, got {:?}", other),
    }
    assert!(matches!(events.recv().await, Some(TrackerEvent::StreamLive(_))));

    // The session is recorded as seen even though one sink failed.
    let stored = h.registry.get(&rec.key()).await.unwrap();
    assert_eq!(stored.session_id, "vid1");
    Ok(())
}

#[tokio::test]
async fn test_poll_isolates_failing_records() -> Result<(), Error> {
    let h = harness(200).await?;
    h.registry.add(Platform::Legacy, "alice", "1").await?;
    h.registry.add(Platform::Legacy, "bob", "2").await?;
    h.registry.add(Platform::Legacy, "carol", "3").await?;

    let fake = Arc::new(FakeHttpClient::new());
    fake.respond(
        "/api/channels/alice",
        HttpResponse::new(200, r#"{"online":true,"broadcast_id":"a1","category":"Minecraft"}"#),
    );
    fake.respond("/api/channels/bob", HttpResponse::new(502, "Bad Gateway"));
    fake.respond("/api/channels/carol", HttpResponse::new(404, "Not Found"));
    let adapter = LegacyAdapter::new(fake.clone(), "https://legacy.example");

    h.clock.store(1000, Ordering::SeqCst);
    let summary = poll_once(&adapter, &h.tracker).await;
    assert_eq!(summary, PollSummary { checked: 3, notified: 1, errors: 1 });
    assert_eq!(fake.requests().len(), 3);

    let alice = h.registry.get(&StreamKey::new(Platform::Legacy, "alice")).await.unwrap();
    assert_eq!(alice.session_id, "a1");
    let posts = h.slack.posts();
    assert_eq!(posts[0].1["attachments"][0]["title_link"], "https://legacy.example/alice");
    Ok(())
}

#[tokio::test]
async fn test_adapter_timeout_is_transient() -> Result<(), Error> {
    struct Hanging;

    #[async_trait]
    impl PlatformAdapter for Hanging {
        fn platform(&self) -> Platform {
            Platform::Twitch
        }

        async fn observe(&self, _service_id: &str) -> Result<Observation, Error> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Observation::live("never", "A"))
        }
    }

    let db = Database::new("sqlite::memory:").await?;
    db.migrate().await?;
    let store: Arc<dyn StreamStore> = Arc::new(SqliteStreamStore::new(db.pool().clone()));
    let registry = Arc::new(StreamRegistry::new(store));
    registry.add(Platform::Twitch, "afro", "7").await?;

    let tracker = StreamTracker::new(
        registry.clone(),
        Arc::new(NotificationDispatcher::new()),
        TrackerConfig {
            adapter_timeout: Duration::from_millis(50),
            ..TrackerConfig::default()
        },
    );

    let summary = poll_once(&Hanging, &tracker).await;
    assert_eq!(summary, PollSummary { checked: 1, notified: 0, errors: 1 });
    assert!(!registry.get(&StreamKey::new(Platform::Twitch, "afro")).await.unwrap().is_live());
    Ok(())
}
