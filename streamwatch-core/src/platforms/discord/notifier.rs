// ========================================================
// File: streamwatch-core/src/platforms/discord/notifier.rs
// ========================================================
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use twilight_http::Client as HttpClient;
use twilight_model::channel::message::Embed;
use twilight_model::id::marker::ChannelMarker;
use twilight_model::id::Id;
use twilight_model::util::Timestamp;
use twilight_util::builder::embed::{EmbedAuthorBuilder, EmbedBuilder, EmbedFieldBuilder, ImageSource};

use streamwatch_common::models::notification::StreamNotification;
use streamwatch_common::traits::notification_traits::NotificationSink;

use crate::Error;

/// Posts a go-live embed into one or more Discord channels with a bot token.
pub struct DiscordNotifier {
    http: Arc<HttpClient>,
    channels: Vec<Id<ChannelMarker>>,
    /// Optional message content sent alongside the embed, e.g. `<@&role>`.
    mention: Option<String>,
}

impl DiscordNotifier {
    /// `channel_ids` are Discord snowflakes as strings.
    pub fn new(bot_token: &str, channel_ids: &[String]) -> Result<Self, Error> {
        let http = Arc::new(HttpClient::new(bot_token.to_string()));
        Self::with_client(http, channel_ids)
    }

    pub fn with_client(http: Arc<HttpClient>, channel_ids: &[String]) -> Result<Self, Error> {
        let mut channels = Vec::with_capacity(channel_ids.len());
        for raw in channel_ids {
            let id = raw
                .trim()
                .parse::<u64>()
                .ok()
                .and_then(Id::<ChannelMarker>::new_checked)
                .ok_or_else(|| Error::Config(format!("Invalid Discord channel id: '{raw}'")))?;
            channels.push(id);
        }
        if channels.is_empty() {
            return Err(Error::Config("Discord notifier needs at least one channel id".into()));
        }
        Ok(Self { http, channels, mention: None })
    }

    pub fn with_mention(mut self, mention: impl Into<String>) -> Self {
        let mention = mention.into();
        self.mention = if mention.is_empty() { None } else { Some(mention) };
        self
    }
}

/// Builds the announcement embed. Pure, so it can be checked without a
/// Discord connection.
pub fn build_live_embed(n: &StreamNotification) -> Result<Embed, Error> {
    let mut author = EmbedAuthorBuilder::new(n.username.clone()).url(n.channel_url.clone());
    if let Some(avatar) = &n.user_avatar_url {
        match ImageSource::url(avatar.clone()) {
            Ok(src) => author = author.icon_url(src),
            Err(e) => warn!("Ignoring unusable avatar URL '{}': {}", avatar, e),
        }
    }

    let playing = if n.category.is_empty() { "Unknown".to_string() } else { n.category.clone() };

    let timestamp = Timestamp::from_secs(n.timestamp.timestamp())
        .map_err(|e| Error::Notify(format!("Bad notification timestamp: {e}")))?;

    let mut embed = EmbedBuilder::new()
        .title(format!("{} is live on {}!", n.username, n.platform.display_name()))
        .url(n.channel_url.clone())
        .color(n.platform_display_color)
        .author(author)
        .field(EmbedFieldBuilder::new("Playing", playing).inline())
        .timestamp(timestamp);

    // Discord rejects an empty description.
    if !n.description.is_empty() {
        embed = embed.description(n.description.clone());
    }

    Ok(embed.build())
}

#[async_trait]
impl NotificationSink for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send(&self, notification: &StreamNotification) -> Result<(), Error> {
        let embed = build_live_embed(notification)?;
        let embeds = [embed];

        let mut failures = Vec::new();
        for channel_id in &self.channels {
            let mut request = self.http.create_message(*channel_id).embeds(&embeds);
            if let Some(mention) = &self.mention {
                request = request.content(mention);
            }

            match request.await {
                Ok(_) => info!("Posted live announcement for '{}' to Discord channel {}", notification.username, channel_id),
                Err(e) => {
                    warn!("Discord channel {} rejected live announcement: {:?}", channel_id, e);
                    failures.push(format!("{channel_id}: {e}"));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Notify(format!(
                "Discord delivery failed for {} of {} channel(s): {}",
                failures.len(),
                self.channels.len(),
                failures.join("; ")
            )))
        }
    }
}
