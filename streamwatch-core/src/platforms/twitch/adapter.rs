// File: streamwatch-core/src/platforms/twitch/adapter.rs

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, warn};

use streamwatch_common::models::platform::Platform;
use streamwatch_common::models::stream::Observation;
use streamwatch_common::traits::platform_traits::PlatformAdapter;

use crate::Error;
use crate::platforms::parse_rfc3339_secs;
use crate::platforms::twitch::client::TwitchHelixClient;

/// Avatar looked up for one broadcast of a channel.
struct CachedAvatar {
    stream_id: String,
    url: Option<String>,
}

/// Polls Helix for a channel's live stream. The service id is the channel's
/// login name.
///
/// The profile image is fetched once per broadcast; steady-state ticks only
/// hit `/streams`.
pub struct TwitchAdapter {
    client: TwitchHelixClient,
    avatars: Mutex<HashMap<String, CachedAvatar>>,
}

impl TwitchAdapter {
    pub fn new(client: TwitchHelixClient) -> Self {
        Self {
            client,
            avatars: Mutex::new(HashMap::new()),
        }
    }

    fn cached_avatar(&self, login: &str, stream_id: &str) -> Option<Option<String>> {
        let avatars = self.avatars.lock().unwrap_or_else(|e| e.into_inner());
        avatars
            .get(login)
            .filter(|c| c.stream_id == stream_id)
            .map(|c| c.url.clone())
    }

    async fn avatar_for(&self, login: &str, stream_id: &str) -> Option<String> {
        if let Some(url) = self.cached_avatar(login, stream_id) {
            debug!("Twitch '{}': avatar cached for stream {}", login, stream_id);
            return url;
        }

        // The avatar is only decoration; a failed lookup doesn't fail the poll
        // and is retried on the next tick.
        let url = match self.client.fetch_user(login).await {
            Ok(user) => user.map(|u| u.profile_image_url).filter(|u| !u.is_empty()),
            Err(e) => {
                warn!("Twitch '{}': could not fetch user profile: {}", login, e);
                return None;
            }
        };

        let mut avatars = self.avatars.lock().unwrap_or_else(|e| e.into_inner());
        avatars.insert(
            login.to_string(),
            CachedAvatar {
                stream_id: stream_id.to_string(),
                url: url.clone(),
            },
        );
        url
    }
}

#[async_trait]
impl PlatformAdapter for TwitchAdapter {
    fn platform(&self) -> Platform {
        Platform::Twitch
    }

    async fn observe(&self, service_id: &str) -> Result<Observation, Error> {
        let Some(stream) = self.client.fetch_live_stream(service_id).await? else {
            return Ok(Observation::offline());
        };

        let login = service_id.trim().to_lowercase();
        let avatar = self.avatar_for(&login, &stream.id).await;

        let mut obs = Observation::live(stream.id, stream.game_name)
            .title(stream.title)
            .display_name(stream.user_name);

        match parse_rfc3339_secs(&stream.started_at) {
            Ok(ts) => obs = obs.started_at(ts),
            Err(e) => warn!("Twitch '{}': bad started_at '{}': {}", service_id, stream.started_at, e),
        }

        if let Some(url) = avatar {
            obs = obs.avatar_url(url);
        }

        Ok(obs)
    }
}
