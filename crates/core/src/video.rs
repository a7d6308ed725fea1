//! [`Video`] protocol object for recorded page sessions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use drover_runtime::Result;
use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};

/// Handle for a page's recorded video.
///
/// Recording starts when the context is created with a video directory and
/// finishes when the page closes; save or inspect the file only after
/// [`Page::close`](crate::Page::close) completes.
///
/// See <https://playwright.dev/docs/api/class-video>
#[derive(Clone)]
pub struct Video {
	base: ChannelOwnerImpl,
}

impl Video {
	/// Creates a new Video from protocol initialization.
	pub fn new(parent: Arc<dyn ChannelOwner>, type_name: String, guid: Arc<str>, initializer: Value) -> Result<Self> {
		let base = ChannelOwnerImpl::new(ParentOrConnection::Parent(parent), type_name, guid, initializer);
		Ok(Self { base })
	}

	fn channel(&self) -> &Channel {
		self.base.channel()
	}

	/// Path of the recording inside the video directory.
	///
	/// See <https://playwright.dev/docs/api/class-video#video-path>
	pub async fn path(&self) -> Result<PathBuf> {
		#[derive(Deserialize)]
		struct PathResponse {
			value: String,
		}

		let result: PathResponse = self.channel().send("path", serde_json::json!({})).await?;
		Ok(PathBuf::from(result.value))
	}

	/// Copies the finished recording to `path`.
	///
	/// See <https://playwright.dev/docs/api/class-video#video-save-as>
	pub async fn save_as(&self, path: &Path) -> Result<()> {
		let params = serde_json::json!({ "path": path.to_string_lossy() });
		self.channel().send_no_result("saveAs", params).await
	}

	/// Deletes the recording.
	///
	/// See <https://playwright.dev/docs/api/class-video#video-delete>
	pub async fn delete(&self) -> Result<()> {
		self.channel().send_no_result("delete", serde_json::json!({})).await
	}
}

impl drover_runtime::channel_owner::private::Sealed for Video {}

impl ChannelOwner for Video {
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

impl std::fmt::Debug for Video {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Video").field("guid", &self.guid()).finish()
	}
}
