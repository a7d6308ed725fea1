//! [`BrowserContext`] protocol object, an isolated browser session.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};
use drover_runtime::{Error, Result};

use crate::{Dialog, Page, Tracing};

/// An isolated session within a browser: own cookies, cache, and pages.
///
/// See <https://playwright.dev/docs/api/class-browsercontext>
#[derive(Clone)]
pub struct BrowserContext {
	base: ChannelOwnerImpl,
}

#[derive(Deserialize)]
struct NewPageResponse {
	page: PageRef,
}

#[derive(Deserialize)]
struct PageRef {
	#[serde(deserialize_with = "drover_runtime::connection::deserialize_arc_str")]
	guid: Arc<str>,
}

impl BrowserContext {
	/// Creates a new BrowserContext from protocol initialization.
	///
	/// Dialog events are delivered per context, so the subscription is enabled
	/// here once rather than per page. The RPC is spawned because construction
	/// happens inside the dispatch loop, which cannot await its own responses.
	pub fn new(parent: Arc<dyn ChannelOwner>, type_name: String, guid: Arc<str>, initializer: Value) -> Result<Self> {
		let base = ChannelOwnerImpl::new(ParentOrConnection::Parent(parent), type_name, guid, initializer);

		let channel = base.channel().clone();
		tokio::spawn(async move {
			let params = serde_json::json!({ "event": "dialog", "enabled": true });
			if let Err(e) = channel.send_no_result("updateSubscription", params).await {
				tracing::warn!(error = %e, "failed to subscribe to dialog events");
			}
		});

		Ok(Self { base })
	}

	fn channel(&self) -> &Channel {
		self.base.channel()
	}

	/// Opens a new page in this context.
	///
	/// See <https://playwright.dev/docs/api/class-browsercontext#browser-context-new-page>
	pub async fn new_page(&self) -> Result<Page> {
		let result: NewPageResponse = self.channel().send("newPage", serde_json::json!({})).await?;

		let page_arc = self
			.base
			.connection()
			.wait_for_object(&result.page.guid, Duration::from_secs(1))
			.await?;

		page_arc.downcast_ref::<Page>().cloned().ok_or(Error::ObjectNotFound {
			guid: result.page.guid.to_string(),
			expected: Some("Page"),
		})
	}

	/// Pages currently open in this context, popups included.
	///
	/// See <https://playwright.dev/docs/api/class-browsercontext#browser-context-pages>
	pub fn pages(&self) -> Vec<Page> {
		self.base
			.children()
			.into_iter()
			.filter_map(|child| child.downcast_ref::<Page>().cloned())
			.collect()
	}

	/// Returns the tracing handle for this context, if announced.
	///
	/// See <https://playwright.dev/docs/api/class-browsercontext#browser-context-tracing>
	pub fn tracing(&self) -> Option<Tracing> {
		let tracing_guid = self
			.base
			.initializer()
			.get("tracing")
			.and_then(|v| v.get("guid"))
			.and_then(|v| v.as_str())?;

		self.base
			.children()
			.into_iter()
			.find(|child| child.guid() == tracing_guid)
			.and_then(|child| child.downcast_ref::<Tracing>().cloned())
	}

	/// Closes the context and all its pages.
	///
	/// See <https://playwright.dev/docs/api/class-browsercontext#browser-context-close>
	pub async fn close(&self) -> Result<()> {
		self.channel().send_no_result("close", serde_json::json!({})).await
	}
}

impl drover_runtime::channel_owner::private::Sealed for BrowserContext {}

impl ChannelOwner for BrowserContext {
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

	fn on_event(&self, method: &str, params: Value) {
		match method {
			// Dialogs are announced on the context; the Dialog object's parent
			// is the page that opened it, so routing goes through the parent.
			"dialog" => {
				let Some(dialog_guid) = params.get("dialog").and_then(|v| v.get("guid")).and_then(|v| v.as_str()) else {
					return;
				};

				let Some(dialog_arc) = self.base.connection().get_object(dialog_guid) else {
					tracing::error!(guid = %dialog_guid, "dialog event for unknown object");
					return;
				};

				let Some(dialog) = dialog_arc.downcast_ref::<Dialog>().cloned() else {
					tracing::error!(guid = %dialog_guid, "dialog event for non-Dialog object");
					return;
				};

				let Some(page) = dialog.parent().and_then(|p| p.downcast_ref::<Page>().cloned()) else {
					tracing::warn!(guid = %dialog_guid, "dialog without owning page, dismissing");
					tokio::spawn(async move {
						let _ = dialog.dismiss().await;
					});
					return;
				};

				page.handle_dialog_event(dialog);
			}
			_ => {}
		}
	}

	fn was_collected(&self) -> bool {
		self.base.was_collected()
	}
}

impl std::fmt::Debug for BrowserContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BrowserContext")
			.field("guid", &self.guid())
			.finish()
	}
}
