// File: src/platforms/mod.rs
//
// Streaming services we poll (twitch, youtube, legacy) and chat services we
// announce to (discord, slack).

pub mod twitch;
pub mod youtube;
pub mod legacy;
pub mod discord;
pub mod slack;

use chrono::DateTime;
use crate::Error;

pub use streamwatch_common::traits::platform_traits::PlatformAdapter;

/// RFC 3339 timestamp -> unix seconds.
pub(crate) fn parse_rfc3339_secs(s: &str) -> Result<i64, Error> {
    Ok(DateTime::parse_from_rfc3339(s)?.timestamp())
}
