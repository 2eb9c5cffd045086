use async_trait::async_trait;
use crate::error::Error;
use crate::models::platform::Platform;
use crate::models::stream::Observation;

/// Answers "is this channel live right now?" for one streaming service.
///
/// Implementations translate their own wire shapes and quirks (404 meaning
/// offline, several concurrent broadcasts, ...) into an [`Observation`].
/// Any `Err` is treated by the caller as transient and retried next tick.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    async fn observe(&self, service_id: &str) -> Result<Observation, Error>;
}
