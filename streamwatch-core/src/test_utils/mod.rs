// File: streamwatch-core/src/test_utils/mod.rs
//
// Canned collaborators shared by unit tests and the integration tests in
// `tests/`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::Error;
use crate::http::{HttpClient, HttpResponse};

/// `HttpClient` that answers from a table of `url fragment -> response`.
///
/// The first registered fragment contained in the requested URL wins.
/// Unmatched URLs fail like a network error would.
#[derive(Default)]
pub struct FakeHttpClient {
    routes: Mutex<Vec<(String, HttpResponse)>>,
    gets: Mutex<Vec<(String, HashMap<String, String>)>>,
    posts: Mutex<Vec<(String, serde_json::Value)>>,
}

impl FakeHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url_fragment: &str, response: HttpResponse) {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((url_fragment.to_string(), response));
    }

    /// Like [`respond`](Self::respond), but takes precedence over every
    /// route registered so far.
    pub fn respond_first(&self, url_fragment: &str, response: HttpResponse) {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(0, (url_fragment.to_string(), response));
    }

    /// Every GET so far, as `(url, headers)`.
    pub fn requests(&self) -> Vec<(String, HashMap<String, String>)> {
        self.gets.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Every POST so far, as `(url, json body)`.
    pub fn posts(&self) -> Vec<(String, serde_json::Value)> {
        self.posts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn lookup(&self, url: &str) -> Result<HttpResponse, Error> {
        let routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        routes
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, resp)| resp.clone())
            .ok_or_else(|| Error::Platform(format!("no canned response for {url}")))
    }
}

#[async_trait]
impl HttpClient for FakeHttpClient {
    async fn get(&self, url: &str, headers: HashMap<String, String>) -> Result<HttpResponse, Error> {
        self.gets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((url.to_string(), headers));
        self.lookup(url)
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse, Error> {
        self.posts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((url.to_string(), body.clone()));
        self.lookup(url)
    }
}
