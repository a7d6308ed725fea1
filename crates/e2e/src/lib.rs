//! End-to-end suite for the playlist-builder frontend.
//!
//! The binary drives a real browser through the seven user flows of the
//! playlist app (search, add, remove, Spotify export, keyboard shortcut,
//! initial load), mocking the backend at the network layer so no real API is
//! needed. Scenarios run sequentially against one shared browser, each in a
//! fresh context and page, and the process exits non-zero when any fail.

pub mod config;
pub mod fixtures;
pub mod logging;
pub mod runner;
pub mod scenarios;
pub mod server;

pub use config::SuiteConfig;
pub use runner::{Summary, run_suite};
