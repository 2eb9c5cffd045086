// ========================================================
// File: streamwatch-core/src/platforms/twitch/requests/stream.rs
// ========================================================
use serde::Deserialize;
use tracing::debug;

use crate::Error;
use crate::platforms::twitch::client::TwitchHelixClient;

/// Response from "Get Streams" endpoint.
#[derive(Debug, Deserialize)]
pub struct StreamsResponse {
    pub data: Vec<StreamData>,
}

/// Single stream data record.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamData {
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(rename = "type", default)]
    pub type_field: String, // "live", or "" when something went wrong upstream
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewer_count: u32,
    pub started_at: String,
}

/// Response from "Get Users" endpoint.
#[derive(Debug, Deserialize)]
pub struct UsersResponse {
    pub data: Vec<UserData>,
}

/// Single user record.
#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
}

impl TwitchHelixClient {
    /// The live stream of `login`, or `None` when the channel is offline.
    ///
    /// Helix answers an offline channel with `200` and an empty `data` array.
    pub async fn fetch_live_stream(&self, login: &str) -> Result<Option<StreamData>, Error> {
        let path = format!(
            "streams?user_login={}",
            urlencoding::encode(&login.to_lowercase())
        );
        let resp: StreamsResponse = self.get_json(&path).await?;

        let stream = resp.data.into_iter().find(|s| s.type_field == "live");
        if let Some(s) = &stream {
            debug!(
                "Twitch stream for '{}': id={} game='{}' started_at={}",
                login, s.id, s.game_name, s.started_at
            );
        }
        Ok(stream)
    }

    /// Resolve login -> user record (display name, avatar).
    pub async fn fetch_user(&self, login: &str) -> Result<Option<UserData>, Error> {
        let path = format!(
            "users?login={}",
            urlencoding::encode(&login.to_lowercase())
        );
        let resp: UsersResponse = self.get_json(&path).await?;
        Ok(resp.data.into_iter().next())
    }
}
