//! HTTP Client abstraction layer for platform integrations
//!
//! Platform adapters and webhook sinks talk to the network only through
//! [`HttpClient`], so their wire parsing can be exercised in tests with a
//! canned-response implementation instead of real requests.
//!
//! The default implementation wraps reqwest.
//!
//! # Example Usage:
//! ```ignore
//! use std::sync::Arc;
//! use streamwatch_core::http::{HttpClient, DefaultHttpClient};
//! use streamwatch_core::platforms::twitch::{TwitchAdapter, TwitchHelixClient};
//!
//! let http: Arc<dyn HttpClient> = Arc::new(DefaultHttpClient::new());
//! let adapter = TwitchAdapter::new(TwitchHelixClient::new(http, token, client_id));
//! ```

use ::http::StatusCode;
use async_trait::async_trait;
use reqwest;
use std::collections::HashMap;
use crate::Error;

/// Status code plus body text. Non-2xx responses are *not* turned into
/// errors here; some platforms use them as meaningful answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    /// `None` for codes outside 100..=999.
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status).ok()
    }

    pub fn is_success(&self) -> bool {
        self.status_code().is_some_and(|s| s.is_success())
    }
}

/// A generic trait for making HTTP requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str, headers: HashMap<String, String>) -> Result<HttpResponse, Error>;
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse, Error>;
}

#[derive(Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for DefaultHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn get(&self, url: &str, headers: HashMap<String, String>) -> Result<HttpResponse, Error> {
        let mut request = self.client.get(url);
        for (key, value) in headers {
            request = request.header(&key, value);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse, Error> {
        let response = self.client
            .post(url)
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
