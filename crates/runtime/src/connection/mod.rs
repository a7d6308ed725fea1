//! Request/response correlation and object lifecycle over a transport.
//!
//! The connection assigns every outgoing request an id and resolves the
//! matching response through a oneshot callback. Incoming events drive the
//! object registry: `__create__` instantiates a mirror object through the
//! installed [`ObjectFactory`], `__dispose__` tears one down, `__adopt__`
//! reparents, and everything else is delivered to the addressed object's
//! [`ChannelOwner::on_event`].
//!
//! Cancellation safety: dropping a pending request future removes its
//! callback, so an abandoned wait cannot leak or receive a stale response.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tokio::sync::{Mutex as TokioMutex, mpsc, oneshot};
use tracing::{debug, error, trace, warn};

use crate::channel_owner::{ChannelOwner, DisposeReason, ParentOrConnection};
use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, TransportReceiver};

mod object_store;
#[cfg(test)]
mod tests;

pub use object_store::ObjectStore;

pub fn serialize_arc_str<S: Serializer>(value: &Arc<str>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
	serializer.serialize_str(value)
}

pub fn deserialize_arc_str<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Arc<str>, D::Error> {
	String::deserialize(deserializer).map(Arc::from)
}

/// Request metadata the driver expects on every call.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
	#[serde(rename = "wallTime")]
	pub wall_time: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub internal: Option<bool>,
}

impl Metadata {
	/// Metadata stamped with the current wall-clock time in milliseconds.
	pub fn now() -> Self {
		let wall_time = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_millis() as f64)
			.unwrap_or(0.0);
		Self {
			wall_time,
			internal: Some(false),
		}
	}
}

/// An outgoing method call.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
	pub id: u32,
	#[serde(serialize_with = "serialize_arc_str")]
	pub guid: Arc<str>,
	pub method: String,
	pub params: Value,
	pub metadata: Metadata,
}

/// Error payload inside a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorPayload {
	pub message: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub stack: Option<String>,
}

/// Wrapper matching the driver's `{"error": {...}}` nesting.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorWrapper {
	pub error: ErrorPayload,
}

/// A response correlated to a request by id.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
	pub id: u32,
	#[serde(default)]
	pub result: Option<Value>,
	#[serde(default)]
	pub error: Option<ErrorWrapper>,
}

/// An unsolicited event addressed to an object guid.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
	#[serde(deserialize_with = "deserialize_arc_str")]
	pub guid: Arc<str>,
	pub method: String,
	#[serde(default)]
	pub params: Value,
}

/// Any incoming message.
///
/// Untagged: responses carry an `id`, events carry `guid` + `method`, and
/// anything else is preserved for logging instead of failing the read loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Message {
	Response(Response),
	Event(Event),
	Unknown(Value),
}

/// Converts a driver error payload into [`Error::Remote`].
pub(crate) fn parse_protocol_error(payload: ErrorPayload) -> Error {
	Error::Remote {
		name: payload.name.unwrap_or_else(|| "Error".to_string()),
		message: payload.message,
		stack: payload.stack,
	}
}

/// Connection surface seen by channels and protocol objects.
///
/// Boxed-future methods keep the trait usable as `Arc<dyn ConnectionLike>`.
/// `unregister_object` is synchronous so `dispose` can call it from `Drop`
/// paths without a runtime handle.
pub trait ConnectionLike: Send + Sync {
	/// Sends a method call addressed to `guid` and awaits the raw result.
	fn send_message<'a>(
		&'a self,
		guid: &str,
		method: &str,
		params: Value,
	) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;

	/// Registers an object under its guid.
	fn register_object(&self, guid: &str, object: Arc<dyn ChannelOwner>);

	/// Removes an object from the registry.
	fn unregister_object(&self, guid: &str);

	/// Synchronous registry lookup.
	fn get_object(&self, guid: &str) -> Option<Arc<dyn ChannelOwner>>;

	/// Waits for an object to appear in the registry.
	fn wait_for_object<'a>(
		&'a self,
		guid: &str,
		timeout: Duration,
	) -> Pin<Box<dyn Future<Output = Result<Arc<dyn ChannelOwner>>> + Send + 'a>>;
}

/// Builds client-side mirrors for objects announced by `__create__`.
pub trait ObjectFactory: Send + Sync {
	fn create_object<'a>(
		&'a self,
		parent: ParentOrConnection,
		type_name: String,
		guid: String,
		initializer: Value,
	) -> Pin<Box<dyn Future<Output = Result<Arc<dyn ChannelOwner>>> + Send + 'a>>;
}

type Callbacks = Arc<TokioMutex<HashMap<u32, oneshot::Sender<Result<Value>>>>>;

/// Removes the pending callback if the request future is dropped early.
struct CancelGuard {
	id: u32,
	callbacks: Callbacks,
	completed: bool,
}

impl CancelGuard {
	fn new(id: u32, callbacks: Callbacks) -> Self {
		Self {
			id,
			callbacks,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}
		let id = self.id;
		let callbacks = Arc::clone(&self.callbacks);
		if let Ok(handle) = tokio::runtime::Handle::try_current() {
			handle.spawn(async move {
				callbacks.lock().await.remove(&id);
			});
		}
	}
}

/// Resolves when the matching response arrives.
struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		match Pin::new(&mut this.rx).poll(cx) {
			Poll::Ready(Ok(result)) => {
				this.guard.complete();
				Poll::Ready(result)
			}
			Poll::Ready(Err(_)) => {
				this.guard.complete();
				Poll::Ready(Err(Error::ChannelClosed))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// JSON-RPC connection to a driver process.
pub struct Connection {
	pub(crate) last_id: AtomicU32,
	pub(crate) callbacks: Callbacks,
	objects: ObjectStore,
	factory: Mutex<Option<Arc<dyn ObjectFactory>>>,
	sender: TokioMutex<Option<Box<dyn Transport>>>,
	receiver: Mutex<Option<Box<dyn TransportReceiver>>>,
	message_rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
}

impl Connection {
	/// Wraps transport halves into a connection. Call [`Connection::run`]
	/// to start pumping messages.
	pub fn new(parts: TransportParts) -> Self {
		Self {
			last_id: AtomicU32::new(0),
			callbacks: Arc::new(TokioMutex::new(HashMap::new())),
			objects: ObjectStore::new(),
			factory: Mutex::new(None),
			sender: TokioMutex::new(Some(parts.sender)),
			receiver: Mutex::new(Some(parts.receiver)),
			message_rx: Mutex::new(Some(parts.message_rx)),
		}
	}

	/// Installs the factory used to mirror `__create__` announcements.
	pub fn set_factory(&self, factory: Arc<dyn ObjectFactory>) {
		*self.factory.lock() = Some(factory);
	}

	/// Spawns the transport read loop and the dispatch loop.
	///
	/// Idempotent in effect: the second call finds the slots empty and
	/// returns an error instead of spawning duplicate pumps.
	pub fn run(self: &Arc<Self>) -> Result<()> {
		let receiver = self
			.receiver
			.lock()
			.take()
			.ok_or_else(|| Error::InvalidArgument("connection is already running".to_string()))?;
		let mut message_rx = self
			.message_rx
			.lock()
			.take()
			.ok_or_else(|| Error::InvalidArgument("connection is already running".to_string()))?;

		tokio::spawn(async move {
			if let Err(e) = receiver.run().await {
				debug!(error = %e, "transport read loop ended");
			}
		});

		let connection = Arc::clone(self);
		tokio::spawn(async move {
			while let Some(raw) = message_rx.recv().await {
				match serde_json::from_value::<Message>(raw) {
					Ok(message) => {
						if let Err(e) = connection.dispatch(message).await {
							error!(error = %e, "failed to dispatch message");
						}
					}
					Err(e) => warn!(error = %e, "failed to parse incoming message"),
				}
			}

			// Transport is gone; fail every pending request.
			let mut callbacks = connection.callbacks.lock().await;
			for (_, tx) in callbacks.drain() {
				let _ = tx.send(Err(Error::ChannelClosed));
			}
		});

		Ok(())
	}

	async fn send_message_internal(&self, guid: &str, method: &str, params: Value) -> Result<Value> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		// The driver rejects null params; a call without arguments is `{}`.
		let params = if params.is_null() {
			Value::Object(serde_json::Map::new())
		} else {
			params
		};
		let request = Request {
			id,
			guid: Arc::from(guid),
			method: method.to_string(),
			params,
			metadata: Metadata::now(),
		};
		let message = serde_json::to_value(&request)?;

		trace!(id, guid, method, "send");

		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().await.insert(id, tx);
		let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

		{
			let mut sender = self.sender.lock().await;
			let sender = sender.as_mut().ok_or(Error::ChannelClosed)?;
			sender.send(message).await?;
		}

		ResponseFuture { rx, guard }.await
	}

	/// Routes one incoming message.
	pub async fn dispatch(self: &Arc<Self>, message: Message) -> Result<()> {
		match message {
			Message::Response(response) => {
				let callback = self.callbacks.lock().await.remove(&response.id);
				match callback {
					Some(tx) => {
						let result = match response.error {
							Some(wrapper) => Err(parse_protocol_error(wrapper.error)),
							None => Ok(response.result.unwrap_or(Value::Null)),
						};
						let _ = tx.send(result);
					}
					None => debug!(id = response.id, "response without pending request"),
				}
				Ok(())
			}
			Message::Event(event) => match event.method.as_str() {
				"__create__" => self.handle_create(&event.guid, event.params).await,
				"__dispose__" => self.handle_dispose(&event.guid, &event.params),
				"__adopt__" => self.handle_adopt(&event.guid, &event.params),
				_ => {
					match self.objects.try_get(&event.guid) {
						Some(object) => object.on_event(&event.method, event.params),
						None => debug!(guid = %event.guid, method = %event.method, "event for unknown object"),
					}
					Ok(())
				}
			},
			Message::Unknown(value) => {
				debug!(?value, "ignoring unrecognized message");
				Ok(())
			}
		}
	}

	async fn handle_create(self: &Arc<Self>, parent_guid: &str, params: Value) -> Result<()> {
		let type_name = params
			.get("type")
			.and_then(Value::as_str)
			.ok_or_else(|| Error::ProtocolError("__create__ without type".to_string()))?
			.to_string();
		let guid = params
			.get("guid")
			.and_then(Value::as_str)
			.ok_or_else(|| Error::ProtocolError("__create__ without guid".to_string()))?
			.to_string();
		let initializer = params.get("initializer").cloned().unwrap_or(Value::Null);

		let factory = self
			.factory
			.lock()
			.clone()
			.ok_or_else(|| Error::ProtocolError("no object factory installed".to_string()))?;

		// The top-level Playwright object is announced before any parent
		// exists; it hangs directly off the connection.
		let parent = if type_name == "Playwright" && parent_guid.is_empty() {
			ParentOrConnection::Connection(Arc::clone(self) as Arc<dyn ConnectionLike>)
		} else {
			match self.objects.try_get(parent_guid) {
				Some(parent) => ParentOrConnection::Parent(parent),
				None => {
					return Err(Error::ProtocolError(format!(
						"parent {parent_guid} not found for new {type_name}"
					)));
				}
			}
		};

		trace!(guid = %guid, type_name = %type_name, parent = %parent_guid, "create");

		let object = factory
			.create_object(parent, type_name, guid.clone(), initializer)
			.await?;

		if let Some(parent) = object.parent() {
			parent.add_child(Arc::from(guid.as_str()), Arc::clone(&object));
		}
		self.objects.insert(Arc::from(guid.as_str()), object);
		Ok(())
	}

	fn handle_dispose(&self, guid: &str, params: &Value) -> Result<()> {
		let reason = match params.get("reason").and_then(Value::as_str) {
			Some("gc") => DisposeReason::GarbageCollected,
			_ => DisposeReason::Closed,
		};

		match self.objects.try_get(guid) {
			Some(object) => {
				trace!(guid, ?reason, "dispose");
				object.dispose(reason);
			}
			None => debug!(guid, "dispose for unknown object"),
		}
		Ok(())
	}

	fn handle_adopt(&self, parent_guid: &str, params: &Value) -> Result<()> {
		let child_guid = params
			.get("guid")
			.and_then(Value::as_str)
			.ok_or_else(|| Error::ProtocolError("__adopt__ without guid".to_string()))?;

		let (Some(parent), Some(child)) = (
			self.objects.try_get(parent_guid),
			self.objects.try_get(child_guid),
		) else {
			debug!(parent = parent_guid, child = child_guid, "adopt with unknown participant");
			return Ok(());
		};

		parent.adopt(child);
		Ok(())
	}
}

impl ConnectionLike for Connection {
	fn send_message<'a>(
		&'a self,
		guid: &str,
		method: &str,
		params: Value,
	) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>> {
		let guid = guid.to_string();
		let method = method.to_string();
		Box::pin(async move { self.send_message_internal(&guid, &method, params).await })
	}

	fn register_object(&self, guid: &str, object: Arc<dyn ChannelOwner>) {
		trace!(guid, type_name = object.type_name(), "register");
		self.objects.insert(Arc::from(guid), object);
	}

	fn unregister_object(&self, guid: &str) {
		self.objects.remove(guid);
	}

	fn get_object(&self, guid: &str) -> Option<Arc<dyn ChannelOwner>> {
		self.objects.try_get(guid)
	}

	fn wait_for_object<'a>(
		&'a self,
		guid: &str,
		timeout: Duration,
	) -> Pin<Box<dyn Future<Output = Result<Arc<dyn ChannelOwner>>> + Send + 'a>> {
		let guid = guid.to_string();
		Box::pin(async move { self.objects.wait_for(&guid, timeout).await })
	}
}
