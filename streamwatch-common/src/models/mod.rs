// File: streamwatch-common/src/models/mod.rs
pub mod platform;
pub mod stream;
pub mod notification;

pub use platform::Platform;
pub use stream::{Observation, StreamKey, StreamRecord};
pub use notification::StreamNotification;
