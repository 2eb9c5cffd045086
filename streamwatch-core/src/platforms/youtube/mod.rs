// File: src/platforms/youtube/mod.rs

pub mod adapter;

pub use adapter::YouTubeAdapter;
