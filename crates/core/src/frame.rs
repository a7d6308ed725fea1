//! [`Frame`] protocol object handling navigation and DOM actions.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};
use drover_runtime::{Error, Result};

use drover_protocol::options::{ClickOptions, DEFAULT_TIMEOUT_MS, FillOptions, GotoOptions, PressOptions};
use drover_protocol::js;

use crate::page::Response;

/// A frame within a page. Every page has a main frame; DOM actions are
/// frame-scoped in the protocol.
///
/// All selector-based methods run in strict mode: a selector resolving to
/// more than one element is an error.
///
/// See <https://playwright.dev/docs/api/class-frame>
#[derive(Clone)]
pub struct Frame {
	base: ChannelOwnerImpl,
}

#[derive(Deserialize)]
struct GotoResponse {
	response: Option<ResponseReference>,
}

#[derive(Deserialize)]
struct ResponseReference {
	#[serde(deserialize_with = "drover_runtime::connection::deserialize_arc_str")]
	guid: Arc<str>,
}

#[derive(Deserialize)]
struct ValueResponse {
	value: Option<Value>,
}

fn merge_options(params: &mut Value, opts_json: Value) {
	if let (Some(obj), Some(opts_obj)) = (params.as_object_mut(), opts_json.as_object()) {
		obj.extend(opts_obj.clone());
	}
}

fn ensure_timeout(params: &mut Value) {
	if params.get("timeout").is_none() {
		params["timeout"] = serde_json::json!(DEFAULT_TIMEOUT_MS);
	}
}

impl Frame {
	/// Creates a new Frame from protocol initialization.
	pub fn new(parent: Arc<dyn ChannelOwner>, type_name: String, guid: Arc<str>, initializer: Value) -> Result<Self> {
		let base = ChannelOwnerImpl::new(ParentOrConnection::Parent(parent), type_name, guid, initializer);
		Ok(Self { base })
	}

	fn channel(&self) -> &Channel {
		self.base.channel()
	}

	/// Navigates the frame to `url`.
	///
	/// Returns `None` for navigations without a response (about:blank, data
	/// URLs, same-document).
	///
	/// See <https://playwright.dev/docs/api/class-frame#frame-goto>
	pub async fn goto(&self, url: &str, options: Option<GotoOptions>) -> Result<Option<Response>> {
		let options = options.unwrap_or_default();
		let mut params = serde_json::json!({
			"url": url,
			"timeout": options.timeout.unwrap_or(DEFAULT_TIMEOUT_MS),
		});
		if let Some(wait_until) = options.wait_until {
			params["waitUntil"] = serde_json::to_value(wait_until)?;
		}
		if let Some(referer) = options.referer {
			params["referer"] = serde_json::json!(referer);
		}

		let result: GotoResponse = self.channel().send("goto", params).await?;

		let Some(response_ref) = result.response else {
			return Ok(None);
		};

		// The Response __create__ may land after the goto response.
		let response_arc = self
			.base
			.connection()
			.wait_for_object(&response_ref.guid, Duration::from_secs(1))
			.await?;

		Ok(Some(Response::from_initializer(response_arc.initializer())?))
	}

	/// Clicks the element matching `selector`.
	///
	/// See <https://playwright.dev/docs/api/class-frame#frame-click>
	pub async fn click(&self, selector: &str, options: Option<ClickOptions>) -> Result<()> {
		let mut params = serde_json::json!({ "selector": selector, "strict": true });
		if let Some(options) = options {
			merge_options(&mut params, serde_json::to_value(options)?);
		}
		ensure_timeout(&mut params);
		self.channel().send_no_result("click", params).await
	}

	/// Fills the input or textarea matching `selector` with `value`.
	///
	/// See <https://playwright.dev/docs/api/class-frame#frame-fill>
	pub async fn fill(&self, selector: &str, value: &str, options: Option<FillOptions>) -> Result<()> {
		let mut params = serde_json::json!({ "selector": selector, "strict": true, "value": value });
		if let Some(options) = options {
			merge_options(&mut params, serde_json::to_value(options)?);
		}
		ensure_timeout(&mut params);
		self.channel().send_no_result("fill", params).await
	}

	/// Focuses the element matching `selector` and presses `key`.
	///
	/// `key` takes keyboard event names ("Enter", "ArrowDown") or single
	/// characters ("a", "/").
	///
	/// See <https://playwright.dev/docs/api/class-frame#frame-press>
	pub async fn press(&self, selector: &str, key: &str, options: Option<PressOptions>) -> Result<()> {
		let mut params = serde_json::json!({ "selector": selector, "strict": true, "key": key });
		if let Some(options) = options {
			merge_options(&mut params, serde_json::to_value(options)?);
		}
		ensure_timeout(&mut params);
		self.channel().send_no_result("press", params).await
	}

	/// Returns `element.innerText` of the element matching `selector`.
	///
	/// See <https://playwright.dev/docs/api/class-frame#frame-inner-text>
	pub async fn inner_text(&self, selector: &str) -> Result<String> {
		let params = serde_json::json!({
			"selector": selector,
			"strict": true,
			"timeout": DEFAULT_TIMEOUT_MS,
		});
		let result: ValueResponse = self.channel().send("innerText", params).await?;
		match result.value {
			Some(Value::String(s)) => Ok(s),
			other => Err(Error::ProtocolError(format!("innerText returned {other:?}"))),
		}
	}

	/// Returns `element.innerHTML` of the element matching `selector`.
	///
	/// See <https://playwright.dev/docs/api/class-frame#frame-inner-html>
	pub async fn inner_html(&self, selector: &str) -> Result<String> {
		let params = serde_json::json!({
			"selector": selector,
			"strict": true,
			"timeout": DEFAULT_TIMEOUT_MS,
		});
		let result: ValueResponse = self.channel().send("innerHTML", params).await?;
		match result.value {
			Some(Value::String(s)) => Ok(s),
			other => Err(Error::ProtocolError(format!("innerHTML returned {other:?}"))),
		}
	}

	/// Returns `node.textContent` of the element matching `selector`, or
	/// `None` for elements without text nodes.
	///
	/// See <https://playwright.dev/docs/api/class-frame#frame-text-content>
	pub async fn text_content(&self, selector: &str) -> Result<Option<String>> {
		let params = serde_json::json!({
			"selector": selector,
			"strict": true,
			"timeout": DEFAULT_TIMEOUT_MS,
		});
		let result: ValueResponse = self.channel().send("textContent", params).await?;
		match result.value {
			Some(Value::String(s)) => Ok(Some(s)),
			Some(Value::Null) | None => Ok(None),
			other => Err(Error::ProtocolError(format!("textContent returned {other:?}"))),
		}
	}

	/// Counts elements currently matching `selector`. Does not wait.
	///
	/// See <https://playwright.dev/docs/api/class-frame#frame-query-selector-all>
	pub async fn query_count(&self, selector: &str) -> Result<usize> {
		#[derive(Deserialize)]
		struct QueryAllResponse {
			elements: Vec<Value>,
		}

		let params = serde_json::json!({ "selector": selector });
		let result: QueryAllResponse = self.channel().send("querySelectorAll", params).await?;
		Ok(result.elements.len())
	}

	/// Evaluates a JavaScript expression in the frame and returns the result
	/// decoded to plain JSON.
	///
	/// Pass `is_function: true` when `expression` is a function literal the
	/// driver should invoke.
	///
	/// See <https://playwright.dev/docs/api/class-frame#frame-evaluate>
	pub async fn evaluate(&self, expression: &str, is_function: bool) -> Result<Value> {
		let params = serde_json::json!({
			"expression": expression,
			"isFunction": is_function,
			"arg": js::evaluate_argument(&Value::Null),
		});
		let result: ValueResponse = self.channel().send("evaluateExpression", params).await?;
		Ok(result.value.as_ref().map(js::from_wire).unwrap_or(Value::Null))
	}

	/// Evaluates a JavaScript expression and deserializes the result to `T`.
	pub async fn evaluate_typed<T: serde::de::DeserializeOwned>(&self, expression: &str, is_function: bool) -> Result<T> {
		let value = self.evaluate(expression, is_function).await?;
		serde_json::from_value(value).map_err(Into::into)
	}

	/// Returns the frame's document title.
	///
	/// See <https://playwright.dev/docs/api/class-frame#frame-title>
	pub async fn title(&self) -> Result<String> {
		let result: ValueResponse = self.channel().send("title", serde_json::json!({})).await?;
		match result.value {
			Some(Value::String(s)) => Ok(s),
			_ => Ok(String::new()),
		}
	}
}

impl drover_runtime::channel_owner::private::Sealed for Frame {}

impl ChannelOwner for Frame {
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

impl std::fmt::Debug for Frame {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Frame").field("guid", &self.guid()).finish()
	}
}
