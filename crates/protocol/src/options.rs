//! Option structs for protocol calls.
//!
//! Each struct mirrors the optional parameters of one driver method. Fields
//! serialize in camelCase and are omitted from the wire when `None`, so a
//! default struct produces an empty params object. Builder methods consume
//! and return `self` for chaining.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::types::{KeyboardModifier, MouseButton, NameValue, Position, ScreenshotType, Viewport, WaitUntil};

/// Default timeout applied by the driver when none is given, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: f64 = 30000.0;

/// Options for `frame.goto`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GotoOptions {
	/// Maximum navigation time in milliseconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timeout: Option<f64>,
	/// When to consider navigation succeeded.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub wait_until: Option<WaitUntil>,
	/// Referer header value.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub referer: Option<String>,
}

impl GotoOptions {
	/// Sets the navigation timeout in milliseconds.
	pub fn timeout(mut self, timeout_ms: f64) -> Self {
		self.timeout = Some(timeout_ms);
		self
	}

	/// Sets when navigation is considered finished.
	pub fn wait_until(mut self, wait_until: WaitUntil) -> Self {
		self.wait_until = Some(wait_until);
		self
	}

	/// Sets the referer header for the navigation request.
	pub fn referer(mut self, referer: impl Into<String>) -> Self {
		self.referer = Some(referer.into());
		self
	}
}

/// Options for `frame.click`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickOptions {
	/// Mouse button to use (defaults to left).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub button: Option<MouseButton>,
	/// Number of clicks (2 for double-click).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub click_count: Option<u32>,
	/// Delay between mousedown and mouseup in milliseconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delay: Option<f64>,
	/// Point to click relative to the element's padding box.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub position: Option<Position>,
	/// Modifier keys held during the click.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub modifiers: Option<Vec<KeyboardModifier>>,
	/// Bypass actionability checks.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub force: Option<bool>,
	/// Maximum time to wait for the element in milliseconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timeout: Option<f64>,
	/// Perform actionability checks without clicking.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub trial: Option<bool>,
}

impl ClickOptions {
	/// Sets the mouse button.
	pub fn button(mut self, button: MouseButton) -> Self {
		self.button = Some(button);
		self
	}

	/// Sets the click count.
	pub fn click_count(mut self, count: u32) -> Self {
		self.click_count = Some(count);
		self
	}

	/// Sets the action timeout in milliseconds.
	pub fn timeout(mut self, timeout_ms: f64) -> Self {
		self.timeout = Some(timeout_ms);
		self
	}

	/// Bypasses actionability checks.
	pub fn force(mut self, force: bool) -> Self {
		self.force = Some(force);
		self
	}
}

/// Options for `frame.fill`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillOptions {
	/// Bypass actionability checks.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub force: Option<bool>,
	/// Maximum time to wait for the element in milliseconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timeout: Option<f64>,
}

impl FillOptions {
	/// Sets the action timeout in milliseconds.
	pub fn timeout(mut self, timeout_ms: f64) -> Self {
		self.timeout = Some(timeout_ms);
		self
	}

	/// Bypasses actionability checks.
	pub fn force(mut self, force: bool) -> Self {
		self.force = Some(force);
		self
	}
}

/// Options for `frame.press`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PressOptions {
	/// Delay between keydown and keyup in milliseconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delay: Option<f64>,
	/// Maximum time to wait for the element in milliseconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timeout: Option<f64>,
}

impl PressOptions {
	/// Sets the action timeout in milliseconds.
	pub fn timeout(mut self, timeout_ms: f64) -> Self {
		self.timeout = Some(timeout_ms);
		self
	}

	/// Sets the delay between keydown and keyup.
	pub fn delay(mut self, delay_ms: f64) -> Self {
		self.delay = Some(delay_ms);
		self
	}
}

/// Options for `page.screenshot`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotOptions {
	/// Image format (defaults to PNG).
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	pub screenshot_type: Option<ScreenshotType>,
	/// JPEG quality 0-100, ignored for PNG.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub quality: Option<u32>,
	/// Capture the full scrollable page instead of the viewport.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub full_page: Option<bool>,
	/// Hide the default white background for transparent captures.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub omit_background: Option<bool>,
	/// Maximum time in milliseconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timeout: Option<f64>,
}

impl ScreenshotOptions {
	/// Sets the image format.
	pub fn screenshot_type(mut self, screenshot_type: ScreenshotType) -> Self {
		self.screenshot_type = Some(screenshot_type);
		self
	}

	/// Captures the full scrollable page.
	pub fn full_page(mut self, full_page: bool) -> Self {
		self.full_page = Some(full_page);
		self
	}

	/// Sets the capture timeout in milliseconds.
	pub fn timeout(mut self, timeout_ms: f64) -> Self {
		self.timeout = Some(timeout_ms);
		self
	}
}

/// Canned response for `route.fulfill`.
///
/// Not serialized directly; the route layer assembles the wire params from
/// these fields, deriving `Content-Type` and `Content-Length` headers when
/// they are not given explicitly.
#[derive(Debug, Clone, Default)]
pub struct FulfillOptions {
	/// HTTP status code (defaults to 200).
	pub status: Option<u16>,
	/// Response headers.
	pub headers: Vec<NameValue>,
	/// Response body as text.
	pub body: Option<String>,
	/// Response body as raw bytes, base64-encoded on the wire.
	pub body_bytes: Option<Vec<u8>>,
	/// Shorthand for a `Content-Type` header.
	pub content_type: Option<String>,
}

impl FulfillOptions {
	/// Creates a JSON response with `Content-Type: application/json`.
	pub fn json(body: &Value) -> Self {
		Self {
			content_type: Some("application/json".to_string()),
			body: Some(body.to_string()),
			..Default::default()
		}
	}

	/// Creates a plain-text response.
	pub fn text(body: impl Into<String>) -> Self {
		Self {
			content_type: Some("text/plain".to_string()),
			body: Some(body.into()),
			..Default::default()
		}
	}

	/// Sets the HTTP status code.
	pub fn status(mut self, status: u16) -> Self {
		self.status = Some(status);
		self
	}

	/// Sets the `Content-Type` header.
	pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = Some(content_type.into());
		self
	}

	/// Appends a response header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push(NameValue::new(name, value));
		self
	}

	/// Sets a raw byte body.
	pub fn body_bytes(mut self, bytes: Vec<u8>) -> Self {
		self.body_bytes = Some(bytes);
		self
	}
}

/// Options for `browserType.launch`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchOptions {
	/// Run the browser without a visible window.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub headless: Option<bool>,
	/// Browser distribution channel, e.g. "chrome" or "msedge".
	#[serde(skip_serializing_if = "Option::is_none")]
	pub channel: Option<String>,
	/// Additional arguments passed to the browser process.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub args: Option<Vec<String>>,
	/// Slow down operations by this many milliseconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub slow_mo: Option<f64>,
	/// Maximum time to wait for the browser to start, in milliseconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timeout: Option<f64>,
	/// Directory for downloaded files.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub downloads_path: Option<PathBuf>,
}

impl LaunchOptions {
	/// Sets headless mode.
	pub fn headless(mut self, headless: bool) -> Self {
		self.headless = Some(headless);
		self
	}

	/// Sets the browser channel.
	pub fn channel(mut self, channel: impl Into<String>) -> Self {
		self.channel = Some(channel.into());
		self
	}

	/// Sets the launch timeout in milliseconds.
	pub fn timeout(mut self, timeout_ms: f64) -> Self {
		self.timeout = Some(timeout_ms);
		self
	}
}

/// Video recording settings for a browser context.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordVideo {
	/// Directory where video files are written.
	pub dir: PathBuf,
	/// Video frame size (defaults to viewport size).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub size: Option<Viewport>,
}

/// Options for `browser.newContext`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextOptions {
	/// Disable the default 1280x720 viewport.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub no_default_viewport: Option<bool>,
	/// Fixed viewport size for all pages in the context.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub viewport: Option<Viewport>,
	/// Base URL resolved against by relative navigations.
	#[serde(rename = "baseURL", skip_serializing_if = "Option::is_none")]
	pub base_url: Option<String>,
	/// Ignore HTTPS certificate errors.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ignore_https_errors: Option<bool>,
	/// Record a video of every page in the context.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub record_video: Option<RecordVideo>,
}

impl ContextOptions {
	/// Sets the base URL for relative navigations.
	pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = Some(base_url.into());
		self
	}

	/// Sets a fixed viewport size.
	pub fn viewport(mut self, width: i32, height: i32) -> Self {
		self.viewport = Some(Viewport { width, height });
		self
	}

	/// Enables video recording into the given directory.
	pub fn record_video(mut self, dir: impl Into<PathBuf>) -> Self {
		self.record_video = Some(RecordVideo {
			dir: dir.into(),
			size: None,
		});
		self
	}
}

/// Options for `tracing.tracingStart`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TracingStartOptions {
	/// Capture screenshots during tracing.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub screenshots: Option<bool>,
	/// Capture DOM snapshots during tracing.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub snapshots: Option<bool>,
	/// Include source files in the trace.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sources: Option<bool>,
	/// Trace name shown in the trace viewer.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
}

impl TracingStartOptions {
	/// Captures screenshots and DOM snapshots, the usual debugging setup.
	pub fn full() -> Self {
		Self {
			screenshots: Some(true),
			snapshots: Some(true),
			..Default::default()
		}
	}

	/// Sets the trace title.
	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_options_serialize_empty() {
		let value = serde_json::to_value(GotoOptions::default()).unwrap();
		assert_eq!(value, serde_json::json!({}));

		let value = serde_json::to_value(ClickOptions::default()).unwrap();
		assert_eq!(value, serde_json::json!({}));
	}

	#[test]
	fn goto_options_camel_case() {
		let options = GotoOptions::default()
			.timeout(5000.0)
			.wait_until(WaitUntil::DomContentLoaded);
		let value = serde_json::to_value(options).unwrap();
		assert_eq!(value["timeout"], 5000.0);
		assert_eq!(value["waitUntil"], "domcontentloaded");
	}

	#[test]
	fn screenshot_type_uses_wire_name() {
		let options = ScreenshotOptions::default().screenshot_type(ScreenshotType::Jpeg);
		let value = serde_json::to_value(options).unwrap();
		assert_eq!(value["type"], "jpeg");
		assert!(value.get("screenshotType").is_none());
	}

	#[test]
	fn context_options_base_url_capitalization() {
		let options = ContextOptions::default().base_url("http://localhost:5173");
		let value = serde_json::to_value(options).unwrap();
		assert_eq!(value["baseURL"], "http://localhost:5173");
	}

	#[test]
	fn fulfill_json_sets_content_type() {
		let options = FulfillOptions::json(&serde_json::json!({"results": []}));
		assert_eq!(options.content_type.as_deref(), Some("application/json"));
		assert_eq!(options.body.as_deref(), Some(r#"{"results":[]}"#));
		assert!(options.status.is_none());
	}
}
