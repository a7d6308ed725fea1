//! [`Page`] protocol object representing a browser tab.

mod eval;
mod input;
mod routing;
mod screenshot;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;

use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};
use drover_runtime::{Error, Result};

use drover_protocol::options::{DEFAULT_TIMEOUT_MS, GotoOptions};

pub use crate::handlers::Subscription;
use crate::events::{EventBus, EventWaiter};
use crate::handlers::{HandlerMap, RouteMeta};
use crate::{Dialog, Frame, Route, Video};

/// How an armed dialog should be answered when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogAnswer {
	/// Accept the dialog, submitting the text for prompts.
	Accept(Option<String>),
	/// Dismiss the dialog.
	Dismiss,
}

/// A browser tab or window within a [`BrowserContext`](crate::BrowserContext).
///
/// See <https://playwright.dev/docs/api/class-page>
#[derive(Clone)]
pub struct Page {
	base: ChannelOwnerImpl,
	/// Current URL of the page (wrapped in RwLock for event updates).
	url: Arc<RwLock<String>>,
	/// GUID of the main frame.
	main_frame_guid: Arc<str>,
	/// Route handlers for network interception (with compiled matchers).
	route_handlers: HandlerMap<Route, RouteMeta>,
	/// Popup pages opened by this page.
	popup_bus: Arc<EventBus<Page>>,
	/// One-shot answer for the next dialog. Taken when the dialog fires;
	/// without one the dialog is dismissed so the page never stays frozen.
	armed_dialog: Arc<Mutex<Option<DialogAnswer>>>,
}

impl Page {
	/// Creates a new Page from protocol initialization.
	pub fn new(parent: Arc<dyn ChannelOwner>, type_name: String, guid: Arc<str>, initializer: Value) -> Result<Self> {
		let main_frame_guid: Arc<str> = Arc::from(
			initializer["mainFrame"]["guid"]
				.as_str()
				.ok_or_else(|| Error::ProtocolError("Page initializer missing 'mainFrame.guid'".to_string()))?,
		);

		let base = ChannelOwnerImpl::new(ParentOrConnection::Parent(parent), type_name, guid, initializer);

		Ok(Self {
			base,
			url: Arc::new(RwLock::new("about:blank".to_string())),
			main_frame_guid,
			route_handlers: Arc::new(Mutex::new(IndexMap::new())),
			popup_bus: Arc::new(EventBus::default()),
			armed_dialog: Arc::new(Mutex::new(None)),
		})
	}

	pub(crate) fn channel(&self) -> &Channel {
		self.base.channel()
	}

	/// The page's main frame. DOM actions delegate here.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-main-frame>
	pub fn main_frame(&self) -> Result<Frame> {
		let frame_arc = self
			.base
			.connection()
			.get_object(&self.main_frame_guid)
			.ok_or(Error::ObjectNotFound {
				guid: self.main_frame_guid.to_string(),
				expected: Some("Frame"),
			})?;

		frame_arc.downcast_ref::<Frame>().cloned().ok_or(Error::ObjectNotFound {
			guid: self.main_frame_guid.to_string(),
			expected: Some("Frame"),
		})
	}

	/// Returns the current URL (initially "about:blank").
	///
	/// See <https://playwright.dev/docs/api/class-page#page-url>
	pub fn url(&self) -> String {
		self.url.read().unwrap_or_else(|e| e.into_inner()).clone()
	}

	/// Closes the page.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-close>
	pub async fn close(&self) -> Result<()> {
		self.channel().send_no_result("close", serde_json::json!({})).await
	}

	/// Brings the page to the front (activates the tab).
	///
	/// See <https://playwright.dev/docs/api/class-page#page-bring-to-front>
	pub async fn bring_to_front(&self) -> Result<()> {
		self.channel().send_no_result("bringToFront", serde_json::json!({})).await
	}

	/// Navigates to `url`.
	///
	/// Returns `None` for navigations without a response (about:blank, data
	/// URLs).
	///
	/// See <https://playwright.dev/docs/api/class-page#page-goto>
	pub async fn goto(&self, url: &str, options: Option<GotoOptions>) -> Result<Option<Response>> {
		let rewrite_target = |e: Error| match e {
			Error::TargetClosed { context, .. } => Error::TargetClosed {
				target_type: "Page".to_string(),
				context,
			},
			other => other,
		};

		let frame = self.main_frame().map_err(rewrite_target)?;
		let response = frame.goto(url, options).await.map_err(rewrite_target)?;

		if let Some(ref resp) = response {
			if let Ok(mut page_url) = self.url.write() {
				*page_url = resp.url.clone();
			}
		}

		Ok(response)
	}

	/// Reloads the current page.
	///
	/// Returns `None` for URLs without responses. `referer` in the options is
	/// ignored; reload keeps the original request headers.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-reload>
	pub async fn reload(&self, options: Option<GotoOptions>) -> Result<Option<Response>> {
		#[derive(Deserialize)]
		struct ReloadResponse {
			response: Option<ResponseReference>,
		}

		#[derive(Deserialize)]
		struct ResponseReference {
			#[serde(deserialize_with = "drover_runtime::connection::deserialize_arc_str")]
			guid: Arc<str>,
		}

		let options = options.unwrap_or_default();
		let mut params = serde_json::json!({
			"timeout": options.timeout.unwrap_or(DEFAULT_TIMEOUT_MS),
		});
		if let Some(wait_until) = options.wait_until {
			params["waitUntil"] = serde_json::to_value(wait_until)?;
		}

		// Reload is a Page method in the protocol, not a Frame method.
		let result: ReloadResponse = self.channel().send("reload", params).await?;

		let Some(response_ref) = result.response else {
			return Ok(None);
		};

		let response_arc = self
			.base
			.connection()
			.wait_for_object(&response_ref.guid, Duration::from_secs(1))
			.await?;
		let response = Response::from_initializer(response_arc.initializer())?;

		if let Ok(mut page_url) = self.url.write() {
			*page_url = response.url.clone();
		}

		Ok(Some(response))
	}

	/// Returns the page's title.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-title>
	pub async fn title(&self) -> Result<String> {
		self.main_frame()?.title().await
	}

	/// Returns the video handle if recording is enabled, or `None`.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-video>
	pub fn video(&self) -> Option<Video> {
		let video_guid = self
			.base
			.initializer()
			.get("video")
			.and_then(|v| v.get("guid"))
			.and_then(|v| v.as_str())?;

		self.base
			.children()
			.into_iter()
			.find(|child| child.guid() == video_guid)
			.and_then(|child| child.downcast_ref::<Video>().cloned())
	}

	/// Registers a waiter for the next popup opened by this page.
	///
	/// Call before the action that opens the popup; the waiter is completed
	/// by the popup event even when it fires before `wait` is awaited.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-event-popup>
	pub fn expect_popup(&self, timeout: Duration) -> EventWaiter<Page> {
		let rx = self.popup_bus.register_waiter(|_| true);
		EventWaiter::new(rx, timeout)
	}

	/// Arms a one-shot answer for the next dialog on this page.
	///
	/// Replaces any previously armed answer. Dialogs that fire unarmed are
	/// dismissed automatically.
	pub fn arm_dialog(&self, answer: DialogAnswer) {
		*self.armed_dialog.lock() = Some(answer);
	}

	/// Whether a dialog answer is currently armed and unconsumed.
	pub fn is_dialog_armed(&self) -> bool {
		self.armed_dialog.lock().is_some()
	}

	/// Answers an incoming dialog with the armed answer, or dismisses it.
	pub(crate) fn handle_dialog_event(&self, dialog: Dialog) {
		let answer = self.armed_dialog.lock().take();
		tokio::spawn(async move {
			let result = match answer {
				Some(DialogAnswer::Accept(text)) => dialog.accept(text.as_deref()).await,
				Some(DialogAnswer::Dismiss) => dialog.dismiss().await,
				None => {
					tracing::debug!(kind = %dialog.dialog_type(), message = %dialog.message(), "unarmed dialog, dismissing");
					dialog.dismiss().await
				}
			};
			if let Err(e) = result {
				tracing::warn!(error = %e, "failed to answer dialog");
			}
		});
	}
}

impl drover_runtime::channel_owner::private::Sealed for Page {}

impl ChannelOwner for Page {
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
			"navigated" => {
				if let Some(url_str) = params.get("url").and_then(|v| v.as_str()) {
					if let Ok(mut url) = self.url.write() {
						*url = url_str.to_string();
					}
				}
			}
			"route" => {
				let Some(route_guid) = params.get("route").and_then(|v| v.get("guid")).and_then(|v| v.as_str()) else {
					return;
				};

				let Some(route_arc) = self.base.connection().get_object(route_guid) else {
					tracing::error!(guid = %route_guid, "route event for unknown object");
					return;
				};

				let Some(route) = route_arc.downcast_ref::<Route>().cloned() else {
					tracing::error!(guid = %route_guid, "route event for non-Route object");
					return;
				};

				let page = self.clone();
				tokio::spawn(async move {
					page.on_route_event(route).await;
				});
			}
			"popup" => {
				let Some(page_guid) = params.get("page").and_then(|v| v.get("guid")).and_then(|v| v.as_str()) else {
					return;
				};

				let Some(page_arc) = self.base.connection().get_object(page_guid) else {
					tracing::error!(guid = %page_guid, "popup event for unknown object");
					return;
				};

				let Some(popup) = page_arc.downcast_ref::<Page>().cloned() else {
					tracing::error!(guid = %page_guid, "popup event for non-Page object");
					return;
				};

				tracing::debug!(guid = %page_guid, "popup opened");
				self.popup_bus.emit(popup);
			}
			// Dialog events arrive on the context, which routes them back
			// through handle_dialog_event.
			"dialog" => {}
			_ => {}
		}
	}

	fn was_collected(&self) -> bool {
		self.base.was_collected()
	}
}

impl std::fmt::Debug for Page {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Page")
			.field("guid", &self.guid())
			.field("url", &self.url())
			.finish()
	}
}

/// Response data for navigation operations.
#[derive(Debug, Clone)]
pub struct Response {
	/// URL of the response.
	pub url: String,
	/// HTTP status code.
	pub status: u16,
	/// HTTP status text.
	pub status_text: String,
	/// Whether the status is in the 200-299 range.
	pub ok: bool,
	/// Response headers.
	pub headers: HashMap<String, String>,
}

impl Response {
	/// Builds a Response from a protocol Response object's initializer.
	pub(crate) fn from_initializer(initializer: &Value) -> Result<Self> {
		let status = initializer["status"]
			.as_u64()
			.ok_or_else(|| Error::ProtocolError("Response missing 'status'".to_string()))? as u16;

		let url = initializer["url"]
			.as_str()
			.ok_or_else(|| Error::ProtocolError("Response missing 'url'".to_string()))?
			.to_string();

		let headers = initializer["headers"]
			.as_array()
			.map(|entries| {
				entries
					.iter()
					.filter_map(|h| {
						let name = h["name"].as_str()?;
						let value = h["value"].as_str()?;
						Some((name.to_string(), value.to_string()))
					})
					.collect()
			})
			.unwrap_or_default();

		Ok(Self {
			url,
			status,
			status_text: initializer["statusText"].as_str().unwrap_or("").to_string(),
			ok: (200..300).contains(&status),
			headers,
		})
	}

	/// Returns the URL of the response.
	pub fn url(&self) -> &str {
		&self.url
	}

	/// Returns the HTTP status code.
	pub fn status(&self) -> u16 {
		self.status
	}

	/// Returns the HTTP status text.
	pub fn status_text(&self) -> &str {
		&self.status_text
	}

	/// Returns whether the status is in the 200-299 range.
	pub fn ok(&self) -> bool {
		self.ok
	}

	/// Returns the response headers.
	pub fn headers(&self) -> &HashMap<String, String> {
		&self.headers
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn response_from_initializer_parses_fields() {
		let initializer = serde_json::json!({
			"url": "http://localhost:5173/index.html",
			"status": 200,
			"statusText": "OK",
			"headers": [
				{ "name": "content-type", "value": "text/html" },
				{ "name": "cache-control", "value": "no-store" },
			],
		});

		let response = Response::from_initializer(&initializer).unwrap();
		assert_eq!(response.url(), "http://localhost:5173/index.html");
		assert_eq!(response.status(), 200);
		assert_eq!(response.status_text(), "OK");
		assert!(response.ok());
		assert_eq!(response.headers().get("content-type").map(String::as_str), Some("text/html"));
	}

	#[test]
	fn response_not_ok_outside_2xx() {
		let initializer = serde_json::json!({
			"url": "http://localhost:5173/missing.html",
			"status": 404,
			"statusText": "Not Found",
			"headers": [],
		});

		let response = Response::from_initializer(&initializer).unwrap();
		assert_eq!(response.status(), 404);
		assert!(!response.ok());
	}

	#[test]
	fn response_missing_status_is_protocol_error() {
		let initializer = serde_json::json!({
			"url": "http://localhost:5173/",
			"headers": [],
		});

		let err = Response::from_initializer(&initializer).unwrap_err();
		assert!(matches!(err, Error::ProtocolError(_)));
	}

	#[test]
	fn dialog_answer_replaces_previous_arm() {
		let slot: Arc<Mutex<Option<DialogAnswer>>> = Arc::new(Mutex::new(None));

		*slot.lock() = Some(DialogAnswer::Dismiss);
		*slot.lock() = Some(DialogAnswer::Accept(Some("My Playlist".to_string())));

		let taken = slot.lock().take();
		assert_eq!(taken, Some(DialogAnswer::Accept(Some("My Playlist".to_string()))));
		assert!(slot.lock().is_none());
	}
}
