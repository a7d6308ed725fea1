//! Maps `__create__` type names to concrete protocol objects.

use std::sync::Arc;

use serde_json::Value;

use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};
use drover_runtime::{Error, Result};

use crate::{
	Artifact, Browser, BrowserContext, BrowserType, Dialog, Frame, Page, Playwright, Request,
	ResponseObject, Route, Tracing, Video,
};

fn require_parent(parent: ParentOrConnection, type_name: &str) -> Result<Arc<dyn ChannelOwner>> {
	match parent {
		ParentOrConnection::Parent(p) => Ok(p),
		ParentOrConnection::Connection(_) => Err(Error::ProtocolError(format!(
			"{type_name} must have a parent object"
		))),
	}
}

/// Creates the protocol object for a `__create__` message.
///
/// Unknown type names produce an inert placeholder rather than an error so
/// newer drivers that emit additional types keep working.
pub async fn create_object(
	parent: ParentOrConnection,
	type_name: String,
	guid: Arc<str>,
	initializer: Value,
) -> Result<Arc<dyn ChannelOwner>> {
	let object: Arc<dyn ChannelOwner> = match type_name.as_str() {
		"Playwright" => {
			let connection = match parent {
				ParentOrConnection::Connection(conn) => conn,
				ParentOrConnection::Parent(_) => {
					return Err(Error::ProtocolError(
						"Playwright must be parented to the connection".to_string(),
					));
				}
			};
			Arc::new(Playwright::new(connection, type_name, guid, initializer).await?)
		}
		"BrowserType" => {
			let parent = require_parent(parent, "BrowserType")?;
			Arc::new(BrowserType::new(parent, type_name, guid, initializer)?)
		}
		"Browser" => {
			let parent = require_parent(parent, "Browser")?;
			Arc::new(Browser::new(parent, type_name, guid, initializer)?)
		}
		"BrowserContext" => {
			let parent = require_parent(parent, "BrowserContext")?;
			Arc::new(BrowserContext::new(parent, type_name, guid, initializer)?)
		}
		"Page" => {
			let parent = require_parent(parent, "Page")?;
			Arc::new(Page::new(parent, type_name, guid, initializer)?)
		}
		"Frame" => {
			let parent = require_parent(parent, "Frame")?;
			Arc::new(Frame::new(parent, type_name, guid, initializer)?)
		}
		"Request" => {
			let parent = require_parent(parent, "Request")?;
			Arc::new(Request::new(parent, type_name, guid, initializer)?)
		}
		"Route" => {
			let parent = require_parent(parent, "Route")?;
			Arc::new(Route::new(parent, type_name, guid, initializer)?)
		}
		"Response" => {
			let parent = require_parent(parent, "Response")?;
			Arc::new(ResponseObject::new(parent, type_name, guid, initializer)?)
		}
		"Dialog" => {
			let parent = require_parent(parent, "Dialog")?;
			Arc::new(Dialog::new(parent, type_name, guid, initializer)?)
		}
		"Artifact" => {
			let parent = require_parent(parent, "Artifact")?;
			Arc::new(Artifact::new(parent, type_name, guid, initializer)?)
		}
		"Video" => {
			let parent = require_parent(parent, "Video")?;
			Arc::new(Video::new(parent, type_name, guid, initializer)?)
		}
		"Tracing" => {
			let parent = require_parent(parent, "Tracing")?;
			Arc::new(Tracing::new(parent, type_name, guid, initializer)?)
		}
		_ => {
			tracing::debug!(%type_name, "Unmodeled protocol type, creating placeholder");
			Arc::new(UnknownObject::new(parent, type_name, guid, initializer))
		}
	};

	Ok(object)
}

/// Inert placeholder for protocol types this client does not model.
struct UnknownObject {
	base: ChannelOwnerImpl,
}

impl UnknownObject {
	fn new(
		parent: ParentOrConnection,
		type_name: String,
		guid: Arc<str>,
		initializer: Value,
	) -> Self {
		Self {
			base: ChannelOwnerImpl::new(parent, type_name, guid, initializer),
		}
	}
}

impl drover_runtime::channel_owner::private::Sealed for UnknownObject {}

impl ChannelOwner for UnknownObject {
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

	fn channel(&self) -> &drover_runtime::channel::Channel {
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
