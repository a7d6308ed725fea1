//! Browser automation client and scenario harness over the Playwright driver.
//!
//! The crate speaks the driver's pipe protocol through [`drover_runtime`] and
//! exposes typed protocol objects ([`Playwright`], [`Browser`], [`Page`], …)
//! plus a [`scenario`] layer that scripts a page through navigation, request
//! mocking, DOM injection, input, and bounded assertions.
//!
//! # Example
//!
//! ```ignore
//! use drover::scenario::{MockRule, Scenario};
//! use drover::Playwright;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let playwright = Playwright::launch().await?;
//!     let browser = playwright.chromium().launch(None).await?;
//!     let context = browser.new_context(None).await?;
//!     let page = context.new_page().await?;
//!
//!     let scenario = Scenario::new(page, "http://localhost:5173");
//!     scenario.mock(MockRule::new("**/api/playlist*").json(&serde_json::json!({ "playlist": [] }))).await?;
//!     scenario.goto("/index.html").await?;
//!     scenario.expect_text("#playlist-body", "Noch keine Titel").await?;
//!     scenario.finish()?;
//!
//!     browser.close().await?;
//!     playwright.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod events;
mod handlers;
mod init;
mod object_factory;
mod root;

pub mod artifact;
pub mod browser;
pub mod browser_context;
pub mod browser_type;
pub mod dialog;
pub mod frame;
pub mod page;
pub mod playwright;
pub mod request;
pub mod response;
pub mod route;
pub mod scenario;
pub mod trace;
pub mod video;

pub use artifact::Artifact;
pub use browser::Browser;
pub use browser_context::BrowserContext;
pub use browser_type::BrowserType;
pub use dialog::Dialog;
pub use events::EventWaiter;
pub use frame::Frame;
pub use page::{DialogAnswer, Page, Response, Subscription};
pub use playwright::Playwright;
pub use request::Request;
pub use response::ResponseObject;
pub use route::Route;
pub use scenario::{MockRule, Scenario};
pub use trace::Tracing;
pub use video::Video;

/// Default driver-side timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: f64 = drover_protocol::options::DEFAULT_TIMEOUT_MS;

/// Protocol option and type definitions.
pub use drover_protocol as protocol;

/// Runtime layer: transport, connection, driver process management.
pub use drover_runtime as runtime;

pub use drover_runtime::{Error, Result};
