//! [`Dialog`] protocol object for JavaScript dialogs.

use std::sync::Arc;

use serde_json::Value;

use drover_runtime::Result;
use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};

/// A JavaScript `alert`, `confirm`, `prompt`, or `beforeunload` dialog.
///
/// The page stays frozen until the dialog is answered with
/// [`accept`](Dialog::accept) or [`dismiss`](Dialog::dismiss).
///
/// See <https://playwright.dev/docs/api/class-dialog>
#[derive(Clone)]
pub struct Dialog {
	base: ChannelOwnerImpl,
}

impl Dialog {
	/// Creates a new Dialog from protocol initialization.
	pub fn new(parent: Arc<dyn ChannelOwner>, type_name: String, guid: Arc<str>, initializer: Value) -> Result<Self> {
		let base = ChannelOwnerImpl::new(ParentOrConnection::Parent(parent), type_name, guid, initializer);
		Ok(Self { base })
	}

	fn channel(&self) -> &Channel {
		self.base.channel()
	}

	/// Dialog kind: "alert", "confirm", "prompt", or "beforeunload".
	///
	/// See <https://playwright.dev/docs/api/class-dialog#dialog-type>
	pub fn dialog_type(&self) -> &str {
		self.base.initializer()["type"].as_str().unwrap_or("")
	}

	/// Message shown in the dialog.
	///
	/// See <https://playwright.dev/docs/api/class-dialog#dialog-message>
	pub fn message(&self) -> &str {
		self.base.initializer()["message"].as_str().unwrap_or("")
	}

	/// Default value a prompt would submit.
	///
	/// See <https://playwright.dev/docs/api/class-dialog#dialog-default-value>
	pub fn default_value(&self) -> &str {
		self.base.initializer()["defaultValue"].as_str().unwrap_or("")
	}

	/// Accepts the dialog, submitting `prompt_text` for prompts.
	///
	/// See <https://playwright.dev/docs/api/class-dialog#dialog-accept>
	pub async fn accept(&self, prompt_text: Option<&str>) -> Result<()> {
		let params = match prompt_text {
			Some(text) => serde_json::json!({ "promptText": text }),
			None => serde_json::json!({}),
		};
		self.channel().send_no_result("accept", params).await
	}

	/// Dismisses the dialog.
	///
	/// See <https://playwright.dev/docs/api/class-dialog#dialog-dismiss>
	pub async fn dismiss(&self) -> Result<()> {
		self.channel().send_no_result("dismiss", serde_json::json!({})).await
	}
}

impl drover_runtime::channel_owner::private::Sealed for Dialog {}

impl ChannelOwner for Dialog {
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

impl std::fmt::Debug for Dialog {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Dialog")
			.field("guid", &self.guid())
			.field("type", &self.dialog_type())
			.field("message", &self.message())
			.finish()
	}
}
