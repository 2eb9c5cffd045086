// File: streamwatch-common/src/models/stream.rs

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::models::platform::Platform;

/// Unique identity of a tracked channel. Renders as `platform:serviceID`,
/// which is also the key used by the persistent store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamKey {
    pub platform: Platform,
    pub service_id: String,
}

impl StreamKey {
    pub fn new(platform: Platform, service_id: impl Into<String>) -> Self {
        Self {
            platform,
            service_id: service_id.into(),
        }
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform, self.service_id)
    }
}

impl FromStr for StreamKey {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (platform, service_id) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid stream key (missing ':'): {}", s))?;
        if service_id.is_empty() {
            return Err(format!("Invalid stream key (empty service id): {}", s));
        }
        Ok(StreamKey::new(platform.parse()?, service_id))
    }
}

/// One tracked channel and what we last saw of it.
///
/// `session_id` is empty while the channel is offline. Timestamps are unix
/// seconds, zero meaning "never".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub platform: Platform,
    #[serde(rename = "memberID")]
    pub member_id: String,
    #[serde(rename = "serviceID")]
    pub service_id: String,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub category: String,
    #[serde(rename = "startedAt")]
    pub started_at: i64,
    #[serde(rename = "stoppedAt")]
    pub stopped_at: i64,
}

impl StreamRecord {
    /// A fresh, idle record as created on registration.
    pub fn new(platform: Platform, service_id: impl Into<String>, member_id: impl Into<String>) -> Self {
        Self {
            platform,
            member_id: member_id.into(),
            service_id: service_id.into(),
            session_id: String::new(),
            category: String::new(),
            started_at: 0,
            stopped_at: 0,
        }
    }

    pub fn key(&self) -> StreamKey {
        StreamKey::new(self.platform, self.service_id.clone())
    }

    pub fn is_live(&self) -> bool {
        !self.session_id.is_empty()
    }
}

/// A single poll result for one channel, already normalised by the
/// platform adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    pub live: bool,
    pub session_id: String,
    pub category: String,
    /// When the platform says the broadcast began, if it tells us.
    pub started_at: Option<i64>,

    // Presentation only; never used for state decisions.
    pub title: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl Observation {
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn live(session_id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            live: true,
            session_id: session_id.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    pub fn started_at(mut self, ts: i64) -> Self {
        self.started_at = Some(ts);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// A live report without a session id can't be tracked; it counts as
    /// offline.
    pub fn is_live(&self) -> bool {
        self.live && !self.session_id.is_empty()
    }
}
