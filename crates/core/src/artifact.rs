//! [`Artifact`] protocol object for driver-produced files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use drover_runtime::Result;
use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};

/// A file produced on the driver side, such as a trace archive or video.
///
/// The file lives in the driver's temp area until saved or deleted.
#[derive(Clone)]
pub struct Artifact {
	base: ChannelOwnerImpl,
}

impl Artifact {
	/// Creates a new Artifact from protocol initialization.
	pub fn new(parent: Arc<dyn ChannelOwner>, type_name: String, guid: Arc<str>, initializer: Value) -> Result<Self> {
		let base = ChannelOwnerImpl::new(ParentOrConnection::Parent(parent), type_name, guid, initializer);
		Ok(Self { base })
	}

	fn channel(&self) -> &Channel {
		self.base.channel()
	}

	/// Copies the artifact to `path`, waiting for the producer to finish.
	pub async fn save_as(&self, path: &Path) -> Result<()> {
		let params = serde_json::json!({ "path": path.to_string_lossy() });
		self.channel().send_no_result("saveAs", params).await
	}

	/// Deletes the artifact from the driver's temp area.
	pub async fn delete(&self) -> Result<()> {
		self.channel().send_no_result("delete", serde_json::json!({})).await
	}

	/// Returns the artifact's on-disk path once fully written.
	pub async fn path_after_finished(&self) -> Result<PathBuf> {
		#[derive(Deserialize)]
		struct PathResponse {
			value: String,
		}

		let result: PathResponse = self
			.channel()
			.send("pathAfterFinished", serde_json::json!({}))
			.await?;
		Ok(PathBuf::from(result.value))
	}
}

impl drover_runtime::channel_owner::private::Sealed for Artifact {}

impl ChannelOwner for Artifact {
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

impl std::fmt::Debug for Artifact {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Artifact").field("guid", &self.guid()).finish()
	}
}
