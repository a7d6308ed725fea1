//! [`Route`] protocol object for answering intercepted requests.

use std::sync::Arc;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use serde_json::Value;

use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};
use drover_runtime::{Error, Result};

use drover_protocol::options::FulfillOptions;
use drover_protocol::types::NameValue;

use crate::Request;

/// An intercepted network request awaiting a verdict.
///
/// Exactly one of [`fulfill`](Route::fulfill), [`continue_`](Route::continue_),
/// or [`abort`](Route::abort) must be called; until then the request hangs.
///
/// See <https://playwright.dev/docs/api/class-route>
#[derive(Clone)]
pub struct Route {
	base: ChannelOwnerImpl,
	request: Request,
}

impl Route {
	/// Creates a new Route from protocol initialization.
	///
	/// The referenced Request object is announced before the route, so a plain
	/// registry lookup resolves it.
	pub fn new(parent: Arc<dyn ChannelOwner>, type_name: String, guid: Arc<str>, initializer: Value) -> Result<Self> {
		let request_guid = initializer["request"]["guid"]
			.as_str()
			.ok_or_else(|| Error::ProtocolError("Route initializer missing 'request.guid'".to_string()))?;

		let request_arc = parent.connection().get_object(request_guid).ok_or(Error::ObjectNotFound {
			guid: request_guid.to_string(),
			expected: Some("Request"),
		})?;
		let request = request_arc
			.downcast_ref::<Request>()
			.cloned()
			.ok_or(Error::ObjectNotFound {
				guid: request_guid.to_string(),
				expected: Some("Request"),
			})?;

		let base = ChannelOwnerImpl::new(ParentOrConnection::Parent(parent), type_name, guid, initializer);
		Ok(Self { base, request })
	}

	fn channel(&self) -> &Channel {
		self.base.channel()
	}

	/// The request being intercepted.
	///
	/// See <https://playwright.dev/docs/api/class-route#route-request>
	pub fn request(&self) -> &Request {
		&self.request
	}

	/// Answers the request with a canned response.
	///
	/// `Content-Type` and `Content-Length` headers are derived from the
	/// options when not given explicitly.
	///
	/// See <https://playwright.dev/docs/api/class-route#route-fulfill>
	pub async fn fulfill(&self, options: FulfillOptions) -> Result<()> {
		let status = options.status.unwrap_or(200);

		let (body, is_base64, body_len) = match (options.body, options.body_bytes) {
			(Some(text), _) => {
				let len = text.len();
				(text, false, len)
			}
			(None, Some(bytes)) => {
				let len = bytes.len();
				(BASE64_STANDARD.encode(&bytes), true, len)
			}
			(None, None) => (String::new(), false, 0),
		};

		let mut headers = options.headers;
		if let Some(content_type) = options.content_type {
			if !headers.iter().any(|h| h.name.eq_ignore_ascii_case("content-type")) {
				headers.push(NameValue::new("content-type", content_type));
			}
		}
		if !headers.iter().any(|h| h.name.eq_ignore_ascii_case("content-length")) {
			headers.push(NameValue::new("content-length", body_len.to_string()));
		}

		let params = serde_json::json!({
			"status": status,
			"headers": headers,
			"body": body,
			"isBase64": is_base64,
		});
		self.channel().send_no_result("fulfill", params).await
	}

	/// Lets the request continue to the network unchanged.
	///
	/// See <https://playwright.dev/docs/api/class-route#route-continue>
	pub async fn continue_(&self) -> Result<()> {
		self.channel()
			.send_no_result("continue", serde_json::json!({ "isFallback": false }))
			.await
	}

	/// Aborts the request with an error code (defaults to "failed").
	///
	/// See <https://playwright.dev/docs/api/class-route#route-abort>
	pub async fn abort(&self, error_code: Option<&str>) -> Result<()> {
		let params = serde_json::json!({ "errorCode": error_code.unwrap_or("failed") });
		self.channel().send_no_result("abort", params).await
	}
}

impl drover_runtime::channel_owner::private::Sealed for Route {}

impl ChannelOwner for Route {
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

impl std::fmt::Debug for Route {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Route")
			.field("guid", &self.guid())
			.field("url", &self.request.url())
			.finish()
	}
}
