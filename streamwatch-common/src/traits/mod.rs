// File: streamwatch-common/src/traits/mod.rs
pub mod repository_traits;
pub mod platform_traits;
pub mod notification_traits;

pub use repository_traits::StreamStore;
pub use platform_traits::PlatformAdapter;
pub use notification_traits::NotificationSink;
