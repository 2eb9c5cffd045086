// File: streamwatch-common/src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::platform::Platform;

/// Everything a sink needs to announce that someone went live.
///
/// Sinks turn this into their own message format (Discord embed, Slack
/// attachment, ...); nothing here is pre-rendered markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamNotification {
    pub platform: Platform,
    pub platform_display_color: u32,
    pub member_id: String,
    pub username: String,
    pub user_avatar_url: Option<String>,
    pub channel_url: String,
    pub category: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}
