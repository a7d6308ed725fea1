//! [`Request`] protocol object describing an in-flight network request.

use std::sync::Arc;

use serde_json::Value;

use drover_runtime::Result;
use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};

/// A network request observed by the browser, readable while a matching
/// [`Route`](crate::Route) decides its fate.
///
/// See <https://playwright.dev/docs/api/class-request>
#[derive(Clone)]
pub struct Request {
	base: ChannelOwnerImpl,
}

impl Request {
	/// Creates a new Request from protocol initialization.
	pub fn new(parent: Arc<dyn ChannelOwner>, type_name: String, guid: Arc<str>, initializer: Value) -> Result<Self> {
		let base = ChannelOwnerImpl::new(ParentOrConnection::Parent(parent), type_name, guid, initializer);
		Ok(Self { base })
	}

	/// Request URL.
	///
	/// See <https://playwright.dev/docs/api/class-request#request-url>
	pub fn url(&self) -> &str {
		self.base.initializer()["url"].as_str().unwrap_or("")
	}

	/// HTTP method, e.g. "GET" or "POST".
	///
	/// See <https://playwright.dev/docs/api/class-request#request-method>
	pub fn method(&self) -> &str {
		self.base.initializer()["method"].as_str().unwrap_or("GET")
	}

	/// Whether this request drives a frame navigation.
	///
	/// See <https://playwright.dev/docs/api/class-request#request-is-navigation-request>
	pub fn is_navigation_request(&self) -> bool {
		self.base.initializer()["isNavigationRequest"].as_bool().unwrap_or(false)
	}
}

impl drover_runtime::channel_owner::private::Sealed for Request {}

impl ChannelOwner for Request {
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

impl std::fmt::Debug for Request {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Request")
			.field("guid", &self.guid())
			.field("method", &self.method())
			.field("url", &self.url())
			.finish()
	}
}
