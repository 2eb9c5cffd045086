// src/repositories/sqlite/mod.rs

pub mod stream_records;

pub use stream_records::SqliteStreamStore;
