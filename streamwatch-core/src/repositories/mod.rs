// src/repositories/mod.rs

pub mod sqlite;
pub mod memory;

pub use streamwatch_common::traits::repository_traits::StreamStore;
pub use sqlite::stream_records::SqliteStreamStore;
pub use memory::InMemoryStreamStore;
