// File: src/platforms/legacy/mod.rs

pub mod adapter;

pub use adapter::LegacyAdapter;
