//! Root object used for the protocol handshake.

use std::sync::Arc;

use serde_json::Value;

use drover_runtime::Result;
use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};
use drover_runtime::connection::ConnectionLike;

/// Synthetic object with the empty GUID.
///
/// The driver addresses its `initialize` response and the first `__create__`
/// messages to the empty GUID, so a Root must be registered before the
/// handshake and unregistered once the `Playwright` object exists.
pub struct Root {
	base: ChannelOwnerImpl,
}

impl Root {
	/// Creates the root object. Not produced by the object factory.
	pub fn new(connection: Arc<dyn ConnectionLike>) -> Self {
		let base = ChannelOwnerImpl::new(
			ParentOrConnection::Connection(connection),
			"Root".to_string(),
			Arc::from(""),
			serde_json::json!({}),
		);
		Self { base }
	}

	/// Sends the `initialize` handshake and returns the raw response.
	///
	/// The response carries the GUID of the `Playwright` object, which the
	/// driver creates (along with the browser types) before responding.
	pub async fn initialize(&self) -> Result<Value> {
		self.base
			.channel()
			.send(
				"initialize",
				serde_json::json!({ "sdkLanguage": "rust" }),
			)
			.await
	}
}

impl drover_runtime::channel_owner::private::Sealed for Root {}

impl ChannelOwner for Root {
	fn guid(&self) -> &str {
		self.base.guid()
	}

	fn type_name(&self) -> &str {
		self.base.type_name()
	}

	fn parent(&self) -> Option<Arc<dyn ChannelOwner>> {
		self.base.parent()
	}

	fn connection(&self) -> Arc<dyn ConnectionLike> {
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

	fn on_event(&self, method: &str, params: Value) {
		self.base.on_event(method, params)
	}

	fn was_collected(&self) -> bool {
		self.base.was_collected()
	}
}

impl std::fmt::Debug for Root {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Root").finish()
	}
}
