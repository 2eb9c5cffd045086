// File: streamwatch-core/src/platforms/youtube/adapter.rs
//! YouTube Data API v3 polling.
//!
//! A channel is live when `search?eventType=live` returns a video for it.
//! The search index lags a little, so the video itself is then looked up:
//! that gives the real start time and category, and lets us notice a
//! broadcast which already has an `actualEndTime`. The channel's own
//! avatar comes from `channels?part=snippet`, once per broadcast.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use streamwatch_common::models::platform::Platform;
use streamwatch_common::models::stream::Observation;
use streamwatch_common::traits::platform_traits::PlatformAdapter;

use crate::Error;
use crate::http::HttpClient;
use crate::platforms::parse_rfc3339_secs;

pub const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    #[serde(default)]
    channel_title: String,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    items: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<Video>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Video {
    snippet: VideoSnippet,
    live_streaming_details: Option<LiveStreamingDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    category_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveStreamingDetails {
    actual_start_time: Option<String>,
    actual_end_time: Option<String>,
}

/// The service id is the channel id (`UC...`).
pub struct YouTubeAdapter {
    http: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    /// channel id => (video id, avatar url) of the last lookup.
    avatars: Mutex<HashMap<String, (String, Option<String>)>>,
}

impl YouTubeAdapter {
    pub fn new(http: Arc<dyn HttpClient>, api_key: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: YOUTUBE_API_BASE_URL.to_string(),
            avatars: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path_and_query: &str) -> Result<T, Error> {
        let url = format!(
            "{}/{}&key={}",
            self.base_url,
            path_and_query,
            urlencoding::encode(&self.api_key)
        );
        let resp = self.http.get(&url, HashMap::new()).await
            .map_err(|e| Error::Platform(format!("YouTube network error: {e}")))?;

        if !resp.is_success() {
            return Err(Error::Platform(format!(
                "YouTube API error: HTTP {} => {}",
                resp.status, resp.body
            )));
        }
        serde_json::from_str(&resp.body)
            .map_err(|e| Error::Platform(format!("YouTube parse error: {e}")))
    }

    /// Channel avatar, looked up again only when the broadcast changes.
    /// Failures are logged and retried on the next poll.
    async fn channel_avatar(&self, channel_id: &str, video_id: &str) -> Option<String> {
        {
            let avatars = self.avatars.lock().unwrap_or_else(|e| e.into_inner());
            if let Some((cached_video, url)) = avatars.get(channel_id) {
                if cached_video == video_id {
                    return url.clone();
                }
            }
        }

        let channels: ChannelsResponse = match self
            .get_json(&format!("channels?part=snippet&id={}", urlencoding::encode(channel_id)))
            .await
        {
            Ok(c) => c,
            Err(e) => {
                warn!("YouTube '{}': could not fetch channel avatar: {}", channel_id, e);
                return None;
            }
        };
        let url = channels
            .items
            .into_iter()
            .next()
            .and_then(|c| c.snippet.thumbnails)
            .and_then(|t| t.high.or(t.default))
            .map(|t| t.url);

        let mut avatars = self.avatars.lock().unwrap_or_else(|e| e.into_inner());
        avatars.insert(channel_id.to_string(), (video_id.to_string(), url.clone()));
        url
    }
}

#[async_trait]
impl PlatformAdapter for YouTubeAdapter {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    async fn observe(&self, service_id: &str) -> Result<Observation, Error> {
        let search: SearchResponse = self
            .get_json(&format!(
                "search?part=snippet&channelId={}&eventType=live&type=video",
                urlencoding::encode(service_id)
            ))
            .await?;

        let mut items = search.items.into_iter();
        let Some(item) = items.next() else {
            return Ok(Observation::offline());
        };
        let extra = items.count();
        if extra > 0 {
            // Several concurrent broadcasts: announce the first, ignore the rest.
            warn!(
                "YouTube channel '{}' has {} active live streams; tracking video {}",
                service_id,
                extra + 1,
                item.id.video_id
            );
        }

        // A failed lookup here is an error rather than a degraded observation:
        // reporting an empty category would look like a brand new session.
        let videos: VideosResponse = self
            .get_json(&format!(
                "videos?part=liveStreamingDetails,snippet&id={}",
                urlencoding::encode(&item.id.video_id)
            ))
            .await?;

        let Some(video) = videos.items.into_iter().next() else {
            debug!("YouTube video {} vanished between search and lookup", item.id.video_id);
            return Ok(Observation::offline());
        };

        let details = video.live_streaming_details;
        if details.as_ref().and_then(|d| d.actual_end_time.as_ref()).is_some() {
            debug!("YouTube video {} already ended; search index is stale", item.id.video_id);
            return Ok(Observation::offline());
        }

        let avatar = self.channel_avatar(service_id, &item.id.video_id).await;
        let mut obs = Observation::live(item.id.video_id, video.snippet.category_id)
            .title(video.snippet.title);

        if !item.snippet.channel_title.is_empty() {
            obs = obs.display_name(item.snippet.channel_title);
        }
        if let Some(url) = avatar {
            obs = obs.avatar_url(url);
        }
        if let Some(start) = details.and_then(|d| d.actual_start_time) {
            match parse_rfc3339_secs(&start) {
                Ok(ts) => obs = obs.started_at(ts),
                Err(e) => warn!("YouTube '{}': bad actualStartTime '{}': {}", service_id, start, e),
            }
        }

        Ok(obs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::test_utils::FakeHttpClient;

    fn search_body(video_ids: &[&str]) -> String {
        let items: Vec<serde_json::Value> = video_ids
            .iter()
            .map(|id| {
                serde_json::json!({
                    "id": {"kind": "youtube#video", "videoId": id},
                    "snippet": {
                        "channelTitle": "Lofi Girl",
                        "thumbnails": {"default": {"url": "https://i.ytimg.com/default.jpg"}}
                    }
                })
            })
            .collect();
        serde_json::json!({ "items": items }).to_string()
    }

    const VIDEO: &str = r#"{"items":[{"id":"jfKfPfyJRdk",
        "snippet":{"title":"lofi hip hop radio","categoryId":"10"},
        "liveStreamingDetails":{"actualStartTime":"2022-07-12T14:03:49Z"}}]}"#;

    const CHANNEL: &str = r#"{"items":[{"id":"UCSJ4gkVC6NrvII8umztf0Ow",
        "snippet":{"title":"Lofi Girl","thumbnails":{
            "default":{"url":"https://yt3.ggpht.com/lofi=s88"},
            "high":{"url":"https://yt3.ggpht.com/lofi=s800"}}}}]}"#;

    fn channel_lookups(fake: &FakeHttpClient) -> usize {
        fake.requests().iter().filter(|(u, _)| u.contains("/channels?")).count()
    }

    #[tokio::test]
    async fn live_video_is_normalised() {
        let fake = Arc::new(FakeHttpClient::new());
        fake.respond("/search?", HttpResponse::new(200, search_body(&["jfKfPfyJRdk"])));
        fake.respond("/videos?", HttpResponse::new(200, VIDEO));
        fake.respond("/channels?", HttpResponse::new(200, CHANNEL));

        let obs = YouTubeAdapter::new(fake.clone(), "k").observe("UCSJ4gkVC6NrvII8umztf0Ow").await.unwrap();
        assert!(obs.is_live());
        assert_eq!(obs.session_id, "jfKfPfyJRdk");
        assert_eq!(obs.category, "10");
        assert_eq!(obs.started_at, Some(1657634629));
        assert_eq!(obs.display_name.as_deref(), Some("Lofi Girl"));
        // The channel's avatar, not the video thumbnail from search.
        assert_eq!(obs.avatar_url.as_deref(), Some("https://yt3.ggpht.com/lofi=s800"));

        let urls: Vec<String> = fake.requests().into_iter().map(|(u, _)| u).collect();
        assert!(urls[0].contains("channelId=UCSJ4gkVC6NrvII8umztf0Ow"));
        assert!(urls[0].ends_with("&key=k"));
        assert!(urls[2].contains("channels?part=snippet&id=UCSJ4gkVC6NrvII8umztf0Ow"));
    }

    #[tokio::test]
    async fn channel_avatar_is_fetched_once_per_broadcast() {
        let fake = Arc::new(FakeHttpClient::new());
        fake.respond("/search?", HttpResponse::new(200, search_body(&["v1"])));
        fake.respond("/videos?", HttpResponse::new(200, VIDEO));
        fake.respond("/channels?", HttpResponse::new(200, CHANNEL));
        let adapter = YouTubeAdapter::new(fake.clone(), "k");

        adapter.observe("UC1").await.unwrap();
        let obs = adapter.observe("UC1").await.unwrap();
        assert_eq!(obs.avatar_url.as_deref(), Some("https://yt3.ggpht.com/lofi=s800"));
        assert_eq!(channel_lookups(&fake), 1);

        fake.respond_first("/search?", HttpResponse::new(200, search_body(&["v2"])));
        adapter.observe("UC1").await.unwrap();
        assert_eq!(channel_lookups(&fake), 2);
    }

    #[tokio::test]
    async fn channel_lookup_failure_leaves_avatar_unset() {
        let fake = Arc::new(FakeHttpClient::new());
        fake.respond("/search?", HttpResponse::new(200, search_body(&["v1"])));
        fake.respond("/videos?", HttpResponse::new(200, VIDEO));
        fake.respond("/channels?", HttpResponse::new(500, "backend error"));

        let obs = YouTubeAdapter::new(fake, "k").observe("UC1").await.unwrap();
        assert!(obs.is_live());
        assert_eq!(obs.avatar_url, None);
    }

    #[tokio::test]
    async fn no_items_is_offline() {
        let fake = Arc::new(FakeHttpClient::new());
        fake.respond("/search?", HttpResponse::new(200, r#"{"items":[]}"#));

        let obs = YouTubeAdapter::new(fake, "k").observe("UC1").await.unwrap();
        assert!(!obs.is_live());
    }

    #[tokio::test]
    async fn several_live_streams_pick_the_first() {
        let fake = Arc::new(FakeHttpClient::new());
        fake.respond("/search?", HttpResponse::new(200, search_body(&["first", "second"])));
        fake.respond("/videos?", HttpResponse::new(200, VIDEO));
        fake.respond("/channels?", HttpResponse::new(200, CHANNEL));

        let obs = YouTubeAdapter::new(fake.clone(), "k").observe("UC1").await.unwrap();
        assert_eq!(obs.session_id, "first");
        let (video_url, _) = fake.requests().into_iter().nth(1).unwrap();
        assert!(video_url.contains("id=first"));
    }

    #[tokio::test]
    async fn ended_broadcast_is_offline() {
        let fake = Arc::new(FakeHttpClient::new());
        fake.respond("/search?", HttpResponse::new(200, search_body(&["v1"])));
        fake.respond(
            "/videos?",
            HttpResponse::new(
                200,
                r#"{"items":[{"snippet":{"title":"t","categoryId":"20"},
                "liveStreamingDetails":{"actualStartTime":"2022-07-12T14:03:49Z",
                "actualEndTime":"2022-07-12T16:00:00Z"}}]}"#,
            ),
        );

        let obs = YouTubeAdapter::new(fake, "k").observe("UC1").await.unwrap();
        assert!(!obs.is_live());
    }

    #[tokio::test]
    async fn quota_error_is_platform_error() {
        let fake = Arc::new(FakeHttpClient::new());
        fake.respond("/search?", HttpResponse::new(403, r#"{"error":{"code":403,"message":"quotaExceeded"}}"#));

        let err = YouTubeAdapter::new(fake, "k").observe("UC1").await.unwrap_err();
        assert!(matches!(err, Error::Platform(_)));
    }
}
