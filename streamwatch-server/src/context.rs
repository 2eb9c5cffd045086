//! streamwatch-server/src/context.rs
//!
//! Builds everything the commands need from the parsed [`Args`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use streamwatch_common::models::platform::Platform;
use streamwatch_core::eventbus::{EventBus, EventBusNotifier};
use streamwatch_core::platforms::discord::DiscordNotifier;
use streamwatch_core::platforms::legacy::LegacyAdapter;
use streamwatch_core::platforms::slack::SlackWebhookNotifier;
use streamwatch_core::platforms::twitch::{TwitchAdapter, TwitchHelixClient};
use streamwatch_core::platforms::youtube::YouTubeAdapter;
use streamwatch_core::platforms::PlatformAdapter;
use streamwatch_core::repositories::{SqliteStreamStore, StreamStore};
use streamwatch_core::services::{
    NotificationDispatcher, PolicyTable, ReconcilePolicy, StreamRegistry, StreamTracker, TrackerConfig,
};
use streamwatch_core::{Database, DefaultHttpClient, Error, HttpClient};

use crate::Args;

/// Database and registry; enough for the add/remove/list commands.
pub struct StoreContext {
    pub db: Database,
    pub registry: Arc<StreamRegistry>,
}

impl StoreContext {
    pub async fn new(args: &Args) -> Result<Self, Error> {
        let db = Database::new(&args.db_url).await?;
        db.migrate().await?;

        let store: Arc<dyn StreamStore> = Arc::new(SqliteStreamStore::new(db.pool().clone()));
        let registry = Arc::new(StreamRegistry::load(store).await?);
        Ok(Self { db, registry })
    }
}

/// Everything the poller needs.
pub struct ServerContext {
    pub store: StoreContext,
    pub event_bus: Arc<EventBus>,
    pub tracker: Arc<StreamTracker>,
    pub adapters: Vec<Arc<dyn PlatformAdapter>>,
}

impl ServerContext {
    pub async fn new(args: &Args) -> Result<Self, Error> {
        let store = StoreContext::new(args).await?;
        let event_bus = Arc::new(EventBus::new());
        let http: Arc<dyn HttpClient> = Arc::new(DefaultHttpClient::new());

        let adapters = build_adapters(args, &http);
        if adapters.is_empty() {
            warn!("No platform credentials configured; nothing will be polled");
        }

        let dispatcher = build_dispatcher(args, &http, &event_bus)?;
        if dispatcher.sink_count() == 1 {
            warn!("No Discord or Slack sink configured; announcements stay in-process");
        }

        let tracker = StreamTracker::new(store.registry.clone(), Arc::new(dispatcher), tracker_config(args))
            .with_event_bus(event_bus.clone());

        Ok(Self {
            store,
            event_bus,
            tracker: Arc::new(tracker),
            adapters,
        })
    }
}

fn tracker_config(args: &Args) -> TrackerConfig {
    let mut policies = PolicyTable::default();
    for (platform, window) in [
        (Platform::Twitch, args.twitch_recent_window_secs),
        (Platform::YouTube, args.youtube_recent_window_secs),
        (Platform::Legacy, args.legacy_recent_window_secs),
    ] {
        policies.set(platform, ReconcilePolicy::for_platform(platform).with_recent_window(window));
    }

    TrackerConfig {
        adapter_timeout: Duration::from_secs(args.adapter_timeout_secs),
        legacy_base_url: args.legacy_base_url.clone().unwrap_or_default(),
        policies,
    }
}

fn build_adapters(args: &Args, http: &Arc<dyn HttpClient>) -> Vec<Arc<dyn PlatformAdapter>> {
    let mut adapters: Vec<Arc<dyn PlatformAdapter>> = Vec::new();

    match (&args.twitch_client_id, &args.twitch_token) {
        (Some(client_id), Some(token)) => {
            let client = TwitchHelixClient::new(http.clone(), token, client_id);
            adapters.push(Arc::new(TwitchAdapter::new(client)));
        }
        (None, None) => {}
        _ => warn!("Twitch needs both a client id and a token; skipping Twitch"),
    }

    if let Some(key) = &args.youtube_api_key {
        adapters.push(Arc::new(YouTubeAdapter::new(http.clone(), key)));
    }

    if let Some(base) = &args.legacy_base_url {
        adapters.push(Arc::new(LegacyAdapter::new(http.clone(), base)));
    }

    for a in &adapters {
        info!("Polling enabled for {}", a.platform());
    }
    adapters
}

fn build_dispatcher(
    args: &Args,
    http: &Arc<dyn HttpClient>,
    event_bus: &Arc<EventBus>,
) -> Result<NotificationDispatcher, Error> {
    let mut dispatcher = NotificationDispatcher::new();

    if let Some(token) = &args.discord_token {
        let mut discord = DiscordNotifier::new(token, &args.discord_channel_ids)?;
        if let Some(mention) = &args.discord_mention {
            discord = discord.with_mention(mention.clone());
        }
        dispatcher.register(Arc::new(discord));
    }

    if let Some(url) = &args.slack_webhook_url {
        dispatcher.register(Arc::new(SlackWebhookNotifier::new(http.clone(), url)));
    }

    dispatcher.register(Arc::new(EventBusNotifier::new(event_bus.clone())));
    Ok(dispatcher)
}
