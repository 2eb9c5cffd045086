// File: streamwatch-core/src/platforms/legacy/adapter.rs

use std::collections::HashMap;
use std::sync::Arc;

use ::http::StatusCode;
use async_trait::async_trait;
use serde::Deserialize;

use streamwatch_common::models::platform::Platform;
use streamwatch_common::models::stream::Observation;
use streamwatch_common::traits::platform_traits::PlatformAdapter;

use crate::Error;
use crate::http::HttpClient;

/// `GET {base}/api/channels/{id}` payload.
#[derive(Debug, Deserialize)]
struct ChannelResponse {
    #[serde(default)]
    online: bool,
    broadcast_id: Option<BroadcastId>,
    #[serde(default)]
    category: String,
    started_at: Option<i64>,
    title: Option<String>,
    display_name: Option<String>,
    avatar: Option<String>,
}

/// The legacy API has served broadcast ids both as numbers and strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BroadcastId {
    Text(String),
    Number(i64),
}

impl BroadcastId {
    fn into_string(self) -> String {
        match self {
            BroadcastId::Text(s) => s,
            BroadcastId::Number(n) => n.to_string(),
        }
    }
}

pub struct LegacyAdapter {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl LegacyAdapter {
    pub fn new(http: Arc<dyn HttpClient>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PlatformAdapter for LegacyAdapter {
    fn platform(&self) -> Platform {
        Platform::Legacy
    }

    async fn observe(&self, service_id: &str) -> Result<Observation, Error> {
        let url = format!("{}/api/channels/{}", self.base_url, urlencoding::encode(service_id));
        let resp = self.http.get(&url, HashMap::new()).await
            .map_err(|e| Error::Platform(format!("Legacy network error: {e}")))?;

        // Channels that aren't broadcasting are simply not found.
        if resp.status_code() == Some(StatusCode::NOT_FOUND) {
            return Ok(Observation::offline());
        }
        if !resp.is_success() {
            return Err(Error::Platform(format!(
                "Legacy API error: HTTP {} => {}",
                resp.status, resp.body
            )));
        }

        let channel: ChannelResponse = serde_json::from_str(&resp.body)
            .map_err(|e| Error::Platform(format!("Legacy parse error: {e}")))?;

        let session_id = channel.broadcast_id.map(BroadcastId::into_string).unwrap_or_default();
        if !channel.online || session_id.is_empty() {
            return Ok(Observation::offline());
        }

        let mut obs = Observation::live(session_id, channel.category);
        obs.started_at = channel.started_at.filter(|ts| *ts > 0);
        obs.title = channel.title;
        obs.display_name = channel.display_name;
        obs.avatar_url = channel.avatar;
        Ok(obs)
    }
}
