// File: streamwatch-common/src/models/platform.rs

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// Streaming services we can track a member on.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitch,
    YouTube,
    Legacy,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Twitch, Platform::YouTube, Platform::Legacy];

    /// Brand colour used for notification accents (0xRRGGBB).
    pub fn display_color(&self) -> u32 {
        match self {
            Platform::Twitch => 0x9146FF,
            Platform::YouTube => 0xFF0000,
            Platform::Legacy => 0x6E7781,
        }
    }

    /// Human readable name, e.g. for "X is live on Twitch!".
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Twitch => "Twitch",
            Platform::YouTube => "YouTube",
            Platform::Legacy => "Legacy",
        }
    }

    /// Deep link to a channel. The legacy service has no fixed host, so the
    /// caller supplies its base URL.
    pub fn channel_url(&self, service_id: &str, legacy_base: &str) -> String {
        match self {
            Platform::Twitch => format!("https://twitch.tv/{}", service_id),
            Platform::YouTube => format!("https://www.youtube.com/channel/{}/live", service_id),
            Platform::Legacy => format!("{}/{}", legacy_base.trim_end_matches('/'), service_id),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Twitch => write!(f, "twitch"),
            Platform::YouTube => write!(f, "youtube"),
            Platform::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "twitch" => Ok(Platform::Twitch),
            "youtube" => Ok(Platform::YouTube),
            "legacy" => Ok(Platform::Legacy),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}
