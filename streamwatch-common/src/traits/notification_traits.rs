use async_trait::async_trait;
use crate::error::Error;
use crate::models::notification::StreamNotification;

/// Somewhere a go-live announcement can be posted.
///
/// Each call is a single delivery attempt; retrying is up to the
/// implementation.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Short identifier used in logs, e.g. `discord` or `slack-webhook`.
    fn name(&self) -> &str;

    async fn send(&self, notification: &StreamNotification) -> Result<(), Error>;
}
