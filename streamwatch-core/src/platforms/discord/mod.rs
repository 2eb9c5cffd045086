// File: src/platforms/discord/mod.rs

pub mod notifier;

pub use notifier::{build_live_embed, DiscordNotifier};
