pub mod stream_poll;

pub use stream_poll::{poll_once, spawn_stream_poll_task, PollSummary, DEFAULT_POLL_INTERVAL};
