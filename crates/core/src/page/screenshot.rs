//! Screenshot methods for [`Page`].

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use serde::Deserialize;

use drover_runtime::{Error, Result};

use drover_protocol::options::{DEFAULT_TIMEOUT_MS, ScreenshotOptions};

use super::Page;

#[derive(Deserialize)]
struct ScreenshotResponse {
	binary: String,
}

impl Page {
	/// Captures a screenshot and returns the image bytes.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-screenshot>
	pub async fn screenshot(&self, options: Option<ScreenshotOptions>) -> Result<Vec<u8>> {
		let mut params = match options {
			Some(options) => serde_json::to_value(options)?,
			None => serde_json::json!({ "type": "png" }),
		};
		if params.get("timeout").is_none() {
			params["timeout"] = serde_json::json!(DEFAULT_TIMEOUT_MS);
		}

		let response: ScreenshotResponse = self.channel().send("screenshot", params).await?;

		BASE64_STANDARD
			.decode(&response.binary)
			.map_err(|e| Error::ProtocolError(format!("decode screenshot: {e}")))
	}

	/// Captures a screenshot, writes it to `path`, and returns the bytes.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-screenshot>
	pub async fn screenshot_to_file(&self, path: &std::path::Path, options: Option<ScreenshotOptions>) -> Result<Vec<u8>> {
		let bytes = self.screenshot(options).await?;
		tokio::fs::write(path, &bytes).await?;
		Ok(bytes)
	}
}
