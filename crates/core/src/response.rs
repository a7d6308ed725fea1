//! [`ResponseObject`] protocol object for network responses.

use std::sync::Arc;

use serde_json::Value;

use drover_runtime::Result;
use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};

/// Protocol-side response object.
///
/// Navigation results are exposed through the plain
/// [`Response`](crate::page::Response) data struct built from this object's
/// initializer; this owner mainly keeps the registry typed.
///
/// See <https://playwright.dev/docs/api/class-response>
#[derive(Clone)]
pub struct ResponseObject {
	base: ChannelOwnerImpl,
}

impl ResponseObject {
	/// Creates a new ResponseObject from protocol initialization.
	pub fn new(parent: Arc<dyn ChannelOwner>, type_name: String, guid: Arc<str>, initializer: Value) -> Result<Self> {
		let base = ChannelOwnerImpl::new(ParentOrConnection::Parent(parent), type_name, guid, initializer);
		Ok(Self { base })
	}

	/// HTTP status code.
	pub fn status(&self) -> u16 {
		self.base.initializer()["status"].as_u64().unwrap_or(0) as u16
	}

	/// Response URL.
	pub fn url(&self) -> &str {
		self.base.initializer()["url"].as_str().unwrap_or("")
	}

	/// Whether the status is in the 200-299 range.
	pub fn ok(&self) -> bool {
		(200..300).contains(&self.status())
	}
}

impl drover_runtime::channel_owner::private::Sealed for ResponseObject {}

impl ChannelOwner for ResponseObject {
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

impl std::fmt::Debug for ResponseObject {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ResponseObject")
			.field("guid", &self.guid())
			.field("status", &self.status())
			.finish()
	}
}
