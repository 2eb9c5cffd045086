// File: src/platforms/twitch/mod.rs

pub mod client;
pub mod requests;
pub mod adapter;

pub use client::TwitchHelixClient;
pub use adapter::TwitchAdapter;
