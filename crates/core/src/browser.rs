//! [`Browser`] protocol object representing a launched browser instance.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};
use drover_runtime::{Error, Result};

use drover_protocol::options::ContextOptions;

use crate::BrowserContext;

/// A launched browser instance.
///
/// Contexts created from it are isolated from each other; closing the browser
/// closes all of them.
///
/// See <https://playwright.dev/docs/api/class-browser>
#[derive(Clone)]
pub struct Browser {
	base: ChannelOwnerImpl,
}

#[derive(Deserialize)]
struct NewContextResponse {
	context: ContextRef,
}

#[derive(Deserialize)]
struct ContextRef {
	#[serde(deserialize_with = "drover_runtime::connection::deserialize_arc_str")]
	guid: Arc<str>,
}

impl Browser {
	/// Creates a new Browser from protocol initialization.
	pub fn new(parent: Arc<dyn ChannelOwner>, type_name: String, guid: Arc<str>, initializer: Value) -> Result<Self> {
		let base = ChannelOwnerImpl::new(ParentOrConnection::Parent(parent), type_name, guid, initializer);
		Ok(Self { base })
	}

	fn channel(&self) -> &Channel {
		self.base.channel()
	}

	/// Browser version string, e.g. "120.0.6099.28".
	///
	/// See <https://playwright.dev/docs/api/class-browser#browser-version>
	pub fn version(&self) -> &str {
		self.base.initializer()["version"].as_str().unwrap_or("")
	}

	/// Creates an isolated browser context.
	///
	/// See <https://playwright.dev/docs/api/class-browser#browser-new-context>
	pub async fn new_context(&self, options: Option<ContextOptions>) -> Result<BrowserContext> {
		let options = options.unwrap_or_default();
		let result: NewContextResponse = self.channel().send("newContext", options).await?;

		let context_arc = self
			.base
			.connection()
			.wait_for_object(&result.context.guid, Duration::from_secs(1))
			.await?;

		context_arc
			.downcast_ref::<BrowserContext>()
			.cloned()
			.ok_or(Error::ObjectNotFound {
				guid: result.context.guid.to_string(),
				expected: Some("BrowserContext"),
			})
	}

	/// Closes the browser and all its contexts.
	///
	/// See <https://playwright.dev/docs/api/class-browser#browser-close>
	pub async fn close(&self) -> Result<()> {
		self.channel().send_no_result("close", serde_json::json!({})).await
	}
}

impl drover_runtime::channel_owner::private::Sealed for Browser {}

impl ChannelOwner for Browser {
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

impl std::fmt::Debug for Browser {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Browser")
			.field("guid", &self.guid())
			.field("version", &self.version())
			.finish()
	}
}
