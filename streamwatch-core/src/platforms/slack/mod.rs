// File: src/platforms/slack/mod.rs

pub mod webhook;

pub use webhook::SlackWebhookNotifier;
