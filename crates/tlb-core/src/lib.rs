//! Core domain + application logic for the leaderboard bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the HTTP
//! ingest surface live behind ports (traits) implemented in adapter crates.

pub mod board;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod refresh;
pub mod render;
pub mod store;

pub use errors::{Error, Result};
