//! [`BrowserType`] protocol object for launching browser engines.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};
use drover_runtime::{Error, Result};

use drover_protocol::options::LaunchOptions;

use crate::Browser;

/// One browser engine: chromium, firefox, or webkit.
///
/// See <https://playwright.dev/docs/api/class-browsertype>
#[derive(Clone)]
pub struct BrowserType {
	base: ChannelOwnerImpl,
}

#[derive(Deserialize)]
struct LaunchResponse {
	browser: BrowserRef,
}

#[derive(Deserialize)]
struct BrowserRef {
	#[serde(deserialize_with = "drover_runtime::connection::deserialize_arc_str")]
	guid: Arc<str>,
}

impl BrowserType {
	/// Creates a new BrowserType from protocol initialization.
	pub fn new(parent: Arc<dyn ChannelOwner>, type_name: String, guid: Arc<str>, initializer: Value) -> Result<Self> {
		let base = ChannelOwnerImpl::new(ParentOrConnection::Parent(parent), type_name, guid, initializer);
		Ok(Self { base })
	}

	fn channel(&self) -> &Channel {
		self.base.channel()
	}

	/// Engine name: "chromium", "firefox", or "webkit".
	///
	/// See <https://playwright.dev/docs/api/class-browsertype#browser-type-name>
	pub fn name(&self) -> &str {
		self.base.initializer()["name"].as_str().unwrap_or("")
	}

	/// Path to the browser executable the driver would launch.
	///
	/// See <https://playwright.dev/docs/api/class-browsertype#browser-type-executable-path>
	pub fn executable_path(&self) -> &str {
		self.base.initializer()["executablePath"].as_str().unwrap_or("")
	}

	/// Launches a browser instance.
	///
	/// See <https://playwright.dev/docs/api/class-browsertype#browser-type-launch>
	pub async fn launch(&self, options: Option<LaunchOptions>) -> Result<Browser> {
		let options = options.unwrap_or_default();
		tracing::debug!(engine = %self.name(), headless = ?options.headless, "launching browser");

		let result: LaunchResponse = self.channel().send("launch", options).await?;

		// The Browser __create__ may land after the launch response.
		let browser_arc = self
			.base
			.connection()
			.wait_for_object(&result.browser.guid, Duration::from_secs(1))
			.await?;

		browser_arc
			.downcast_ref::<Browser>()
			.cloned()
			.ok_or(Error::ObjectNotFound {
				guid: result.browser.guid.to_string(),
				expected: Some("Browser"),
			})
	}
}

impl drover_runtime::channel_owner::private::Sealed for BrowserType {}

impl ChannelOwner for BrowserType {
	fn guid(&self) -> &str {
		self.base.guid()
	}

	fn type_name(&self) -> &str {
		self.base.type_name()
	}

	fn parent(&self) -> Option<Arc<dyn ChannelOwner>> {
		self.base.parent()
	}

	fn connection(&self) -> Arc<dyn drover_runtime::connection::ConnectionLike> {
		self.base.connection()
	}

	fn initializer(&self) -> &Value {
		self.base.initializer()
	}

	fn channel(&self) -> &Channel {
		self.base.channel()
	}

	fn dispose(&self, reason: drover_runtime::channel_owner::DisposeReason) {
		self.base.dispose(reason)
	}

	fn adopt(&self, child: Arc<dyn ChannelOwner>) {
		self.base.adopt(child)
	}

	fn add_child(&self, guid: Arc<str>, child: Arc<dyn ChannelOwner>) {
		self.base.add_child(guid, child)
	}

	fn remove_child(&self, guid: &str) {
		self.base.remove_child(guid)
	}

	fn on_event(&self, _method: &str, _params: Value) {}

	fn was_collected(&self) -> bool {
		self.base.was_collected()
	}
}

impl std::fmt::Debug for BrowserType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BrowserType")
			.field("guid", &self.guid())
			.field("name", &self.name())
			.finish()
	}
}
