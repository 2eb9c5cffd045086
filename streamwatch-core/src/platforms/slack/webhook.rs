// File: streamwatch-core/src/platforms/slack/webhook.rs
//! Slack-style incoming webhook. Also accepted by Mattermost, Rocket.Chat
//! and Discord's `/slack` webhook suffix.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use streamwatch_common::models::notification::StreamNotification;
use streamwatch_common::traits::notification_traits::NotificationSink;

use crate::Error;
use crate::http::HttpClient;

pub struct SlackWebhookNotifier {
    http: Arc<dyn HttpClient>,
    webhook_url: String,
}

impl SlackWebhookNotifier {
    pub fn new(http: Arc<dyn HttpClient>, webhook_url: &str) -> Self {
        Self {
            http,
            webhook_url: webhook_url.to_string(),
        }
    }

    /// The attachment payload for one notification.
    pub fn payload(n: &StreamNotification) -> serde_json::Value {
        let mut fields = Vec::new();
        if !n.category.is_empty() {
            fields.push(json!({ "title": "Playing", "value": n.category, "short": true }));
        }

        json!({
            "attachments": [{
                "fallback": format!("{} is live on {}: {}", n.username, n.platform.display_name(), n.channel_url),
                "color": format!("#{:06X}", n.platform_display_color),
                "author_name": n.username,
                "author_icon": n.user_avatar_url,
                "author_link": n.channel_url,
                "title": format!("{} is live on {}!", n.username, n.platform.display_name()),
                "title_link": n.channel_url,
                "text": n.description,
                "fields": fields,
                "ts": n.timestamp.timestamp(),
            }]
        })
    }
}

#[async_trait]
impl NotificationSink for SlackWebhookNotifier {
    fn name(&self) -> &str {
        "slack-webhook"
    }

    async fn send(&self, notification: &StreamNotification) -> Result<(), Error> {
        let body = Self::payload(notification);
        let resp = self.http.post_json(&self.webhook_url, &body).await?;

        if !resp.is_success() {
            return Err(Error::Notify(format!(
                "Slack webhook returned HTTP {} => {}",
                resp.status, resp.body
            )));
        }
        debug!("Slack webhook accepted live announcement for '{}'", notification.username);
        Ok(())
    }
}
