//! Input methods for [`Page`], delegating DOM actions to the main frame.

use drover_runtime::Result;

use drover_protocol::options::{ClickOptions, FillOptions, PressOptions};

use super::Page;

impl Page {
	/// Clicks the element matching `selector`.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-click>
	pub async fn click(&self, selector: &str, options: Option<ClickOptions>) -> Result<()> {
		self.main_frame()?.click(selector, options).await
	}

	/// Fills the input or textarea matching `selector` with `value`.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-fill>
	pub async fn fill(&self, selector: &str, value: &str, options: Option<FillOptions>) -> Result<()> {
		self.main_frame()?.fill(selector, value, options).await
	}

	/// Focuses the element matching `selector` and presses `key`.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-press>
	pub async fn press(&self, selector: &str, key: &str, options: Option<PressOptions>) -> Result<()> {
		self.main_frame()?.press(selector, key, options).await
	}

	/// Presses `key` at page level, dispatched to whatever has focus.
	///
	/// See <https://playwright.dev/docs/api/class-keyboard#keyboard-press>
	pub async fn press_key(&self, key: &str) -> Result<()> {
		self.channel()
			.send_no_result("keyboardPress", serde_json::json!({ "key": key }))
			.await
	}

	/// Returns `element.innerText` of the element matching `selector`.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-inner-text>
	pub async fn inner_text(&self, selector: &str) -> Result<String> {
		self.main_frame()?.inner_text(selector).await
	}

	/// Returns `element.innerHTML` of the element matching `selector`.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-inner-html>
	pub async fn inner_html(&self, selector: &str) -> Result<String> {
		self.main_frame()?.inner_html(selector).await
	}

	/// Returns `node.textContent` of the element matching `selector`.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-text-content>
	pub async fn text_content(&self, selector: &str) -> Result<Option<String>> {
		self.main_frame()?.text_content(selector).await
	}

	/// Counts elements currently matching `selector`. Does not wait.
	pub async fn query_count(&self, selector: &str) -> Result<usize> {
		self.main_frame()?.query_count(selector).await
	}
}
