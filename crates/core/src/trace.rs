//! [`Tracing`] protocol object for recording trace archives.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};
use drover_runtime::{Error, Result};

use drover_protocol::options::TracingStartOptions;

use crate::Artifact;

/// Records a trace of browser operations viewable with
/// `npx playwright show-trace <file>`.
///
/// Obtained via [`BrowserContext::tracing`](crate::BrowserContext::tracing).
///
/// See <https://playwright.dev/docs/api/class-tracing>
#[derive(Clone)]
pub struct Tracing {
	base: ChannelOwnerImpl,
}

#[derive(Deserialize)]
struct StopChunkResponse {
	artifact: Option<ArtifactRef>,
}

#[derive(Deserialize)]
struct ArtifactRef {
	#[serde(deserialize_with = "drover_runtime::connection::deserialize_arc_str")]
	guid: Arc<str>,
}

impl Tracing {
	/// Creates a new Tracing from protocol initialization.
	pub fn new(parent: Arc<dyn ChannelOwner>, type_name: String, guid: Arc<str>, initializer: Value) -> Result<Self> {
		let base = ChannelOwnerImpl::new(ParentOrConnection::Parent(parent), type_name, guid, initializer);
		Ok(Self { base })
	}

	fn channel(&self) -> &Channel {
		self.base.channel()
	}

	/// Starts recording a trace.
	///
	/// The title travels on the chunk, not the start call; the driver rejects
	/// unknown start parameters.
	///
	/// See <https://playwright.dev/docs/api/class-tracing#tracing-start>
	pub async fn start(&self, options: TracingStartOptions) -> Result<()> {
		let title = options.title.clone();

		let mut params = serde_json::to_value(&options)?;
		if let Some(obj) = params.as_object_mut() {
			obj.remove("title");
		}
		self.channel().send_no_result("tracingStart", params).await?;

		let chunk_params = match title {
			Some(title) => serde_json::json!({ "title": title }),
			None => serde_json::json!({}),
		};
		self.channel().send_no_result("tracingStartChunk", chunk_params).await
	}

	/// Stops recording. With a path, the driver archives the chunk into an
	/// artifact which is then copied to `path`; without one the chunk is
	/// discarded.
	///
	/// See <https://playwright.dev/docs/api/class-tracing#tracing-stop>
	pub async fn stop(&self, path: Option<&Path>) -> Result<()> {
		match path {
			Some(path) => {
				let result: StopChunkResponse = self
					.channel()
					.send("tracingStopChunk", serde_json::json!({ "mode": "archive" }))
					.await?;

				if let Some(artifact_ref) = result.artifact {
					let artifact_arc = self
						.base
						.connection()
						.wait_for_object(&artifact_ref.guid, Duration::from_secs(5))
						.await?;
					let artifact = artifact_arc
						.downcast_ref::<Artifact>()
						.cloned()
						.ok_or(Error::ObjectNotFound {
							guid: artifact_ref.guid.to_string(),
							expected: Some("Artifact"),
						})?;

					artifact.save_as(path).await?;
					artifact.delete().await?;
				} else {
					tracing::warn!(path = %path.display(), "trace stop produced no artifact");
				}
			}
			None => {
				self.channel()
					.send_no_result("tracingStopChunk", serde_json::json!({ "mode": "discard" }))
					.await?;
			}
		}

		self.channel().send_no_result("tracingStop", serde_json::json!({})).await
	}
}

impl drover_runtime::channel_owner::private::Sealed for Tracing {}

impl ChannelOwner for Tracing {
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

impl std::fmt::Debug for Tracing {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Tracing").field("guid", &self.guid()).finish()
	}
}
