// src/lib.rs

pub mod db;
pub mod repositories;
pub mod platforms;
pub mod http;
pub mod tasks;
pub mod eventbus;
pub mod services;
pub mod test_utils;

pub use db::Database;
pub use streamwatch_common::error::Error;
pub use self::http::{DefaultHttpClient, HttpClient, HttpResponse};
