// File: streamwatch-core/src/platforms/twitch/client.rs

use std::collections::HashMap;
use std::sync::Arc;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::Error;
use crate::http::HttpClient;

pub const HELIX_BASE_URL: &str = "https://api.twitch.tv/helix";

/// A small wrapper client for calling Helix endpoints.
///
/// Request helpers live in `requests::*` as `impl TwitchHelixClient` blocks.
pub struct TwitchHelixClient {
    http: Arc<dyn HttpClient>,
    bearer_token: String,
    client_id: String,
    base_url: String,
}

impl TwitchHelixClient {
    /// Create a new `TwitchHelixClient`.
    ///
    /// - `bearer_token`: an app access token (no user scopes are needed for
    ///   stream lookups)
    /// - `client_id`: the application's client id
    pub fn new(http: Arc<dyn HttpClient>, bearer_token: &str, client_id: &str) -> Self {
        Self {
            http,
            bearer_token: bearer_token.to_string(),
            client_id: client_id.to_string(),
            base_url: HELIX_BASE_URL.to_string(),
        }
    }

    /// Point at a different Helix host (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// GET `{base}/{path_and_query}` with Helix auth headers, decoding the
    /// JSON body. Any non-2xx status is a platform error.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, Error> {
        let url = format!("{}/{}", self.base_url, path_and_query);

        let mut headers = HashMap::new();
        headers.insert("Client-Id".to_string(), self.client_id.clone());
        headers.insert("Authorization".to_string(), format!("Bearer {}", self.bearer_token));

        let resp = self.http.get(&url, headers).await
            .map_err(|e| Error::Platform(format!("Twitch network error: {e}")))?;

        if !resp.is_success() {
            warn!("Twitch Helix GET {} => status={} body={}", path_and_query, resp.status, resp.body);
            return Err(Error::Platform(format!(
                "Twitch API error: HTTP {} => {}",
                resp.status, resp.body
            )));
        }

        serde_json::from_str(&resp.body)
            .map_err(|e| Error::Platform(format!("Twitch parse error: {e}")))
    }
}
