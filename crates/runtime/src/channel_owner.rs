//! Base trait and shared state for protocol objects.
//!
//! Every remote object the driver creates (Browser, Page, Route, ...) is
//! mirrored client-side by a type implementing [`ChannelOwner`]. The trait
//! covers guid identity, the parent/child lifetime tree, event delivery, and
//! access to the object's RPC [`Channel`]. Concrete types embed
//! [`ChannelOwnerImpl`] and forward to it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use downcast_rs::{DowncastSync, impl_downcast};
use parking_lot::Mutex;
use serde_json::Value;

use crate::channel::Channel;
use crate::connection::ConnectionLike;

/// Marker module for the sealed trait pattern.
pub mod private {
	/// Marker trait implemented alongside [`ChannelOwner`](super::ChannelOwner).
	pub trait Sealed {}
}

type ChildrenRegistry = HashMap<Arc<str>, Arc<dyn ChannelOwner>>;

/// Why an object is being disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposeReason {
	/// Explicitly closed by client code or the driver.
	Closed,
	/// Reclaimed by the driver's garbage collector.
	GarbageCollected,
}

/// A new object's parent: either another object or the connection itself.
///
/// Only the top-level Playwright object hangs directly off the connection.
pub enum ParentOrConnection {
	Parent(Arc<dyn ChannelOwner>),
	Connection(Arc<dyn ConnectionLike>),
}

/// Base trait for all protocol objects.
pub trait ChannelOwner: private::Sealed + DowncastSync {
	/// Unique guid assigned by the driver.
	fn guid(&self) -> &str;

	/// Protocol type name, e.g. "Page" or "Route".
	fn type_name(&self) -> &str;

	/// Parent object, if still alive.
	fn parent(&self) -> Option<Arc<dyn ChannelOwner>>;

	/// Connection this object belongs to.
	fn connection(&self) -> Arc<dyn ConnectionLike>;

	/// Raw initializer JSON from the `__create__` message.
	fn initializer(&self) -> &Value;

	/// RPC channel bound to this object's guid.
	fn channel(&self) -> &Channel;

	/// Disposes this object and all its children.
	fn dispose(&self, reason: DisposeReason);

	/// Moves a child from its old parent to this object.
	fn adopt(&self, child: Arc<dyn ChannelOwner>);

	/// Adds a child to this object's registry.
	fn add_child(&self, guid: Arc<str>, child: Arc<dyn ChannelOwner>);

	/// Removes a child from this object's registry.
	fn remove_child(&self, guid: &str);

	/// Delivers a protocol event addressed to this object.
	fn on_event(&self, method: &str, params: Value);

	/// True once the driver garbage-collected this object.
	fn was_collected(&self) -> bool;
}

impl_downcast!(sync ChannelOwner);

impl std::fmt::Debug for dyn ChannelOwner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChannelOwner")
			.field("guid", &self.guid())
			.field("type_name", &self.type_name())
			.finish_non_exhaustive()
	}
}

/// Shared state embedded by every concrete protocol object.
pub struct ChannelOwnerImpl {
	guid: Arc<str>,
	type_name: String,
	parent: Option<Weak<dyn ChannelOwner>>,
	connection: Arc<dyn ConnectionLike>,
	children: Arc<Mutex<ChildrenRegistry>>,
	channel: Channel,
	initializer: Value,
	was_collected: AtomicBool,
}

// Manual Clone: AtomicBool is not Clone, and clones share the children map.
impl Clone for ChannelOwnerImpl {
	fn clone(&self) -> Self {
		Self {
			guid: self.guid.clone(),
			type_name: self.type_name.clone(),
			parent: self.parent.clone(),
			connection: Arc::clone(&self.connection),
			children: Arc::clone(&self.children),
			channel: self.channel.clone(),
			initializer: self.initializer.clone(),
			was_collected: AtomicBool::new(self.was_collected.load(Ordering::SeqCst)),
		}
	}
}

impl ChannelOwnerImpl {
	/// Creates the base state for a new protocol object.
	pub fn new(parent: ParentOrConnection, type_name: String, guid: Arc<str>, initializer: Value) -> Self {
		let (connection, parent_opt) = match parent {
			ParentOrConnection::Parent(p) => {
				let conn = p.connection();
				(conn, Some(Arc::downgrade(&p)))
			}
			ParentOrConnection::Connection(c) => (c, None),
		};

		let channel = Channel::new(Arc::clone(&guid), connection.clone());

		Self {
			guid,
			type_name,
			parent: parent_opt,
			connection,
			children: Arc::new(Mutex::new(HashMap::new())),
			channel,
			initializer,
			was_collected: AtomicBool::new(false),
		}
	}

	pub fn guid(&self) -> &str {
		&self.guid
	}

	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	pub fn parent(&self) -> Option<Arc<dyn ChannelOwner>> {
		self.parent.as_ref().and_then(|p| p.upgrade())
	}

	pub fn connection(&self) -> Arc<dyn ConnectionLike> {
		self.connection.clone()
	}

	pub fn initializer(&self) -> &Value {
		&self.initializer
	}

	pub fn channel(&self) -> &Channel {
		&self.channel
	}

	/// Disposes this object and all children recursively.
	///
	/// Detaches from the parent and the connection registry first so event
	/// dispatch stops seeing this guid while children are torn down.
	pub fn dispose(&self, reason: DisposeReason) {
		if reason == DisposeReason::GarbageCollected {
			self.was_collected.store(true, Ordering::SeqCst);
		}

		if let Some(parent) = self.parent() {
			parent.remove_child(&self.guid);
		}

		self.connection.unregister_object(&self.guid);

		let children: Vec<_> = {
			let guard = self.children.lock();
			guard.values().cloned().collect()
		};
		for child in children {
			child.dispose(reason);
		}

		self.children.lock().clear();
	}

	/// Moves a child from its old parent to this object.
	pub fn adopt(&self, child: Arc<dyn ChannelOwner>) {
		if let Some(old_parent) = child.parent() {
			old_parent.remove_child(child.guid());
		}
		self.add_child(Arc::from(child.guid()), child);
	}

	pub fn add_child(&self, guid: Arc<str>, child: Arc<dyn ChannelOwner>) {
		self.children.lock().insert(guid, child);
	}

	pub fn remove_child(&self, guid: &str) {
		let guid_arc: Arc<str> = Arc::from(guid);
		self.children.lock().remove(&guid_arc);
	}

	/// All current children of this object.
	pub fn children(&self) -> Vec<Arc<dyn ChannelOwner>> {
		self.children.lock().values().cloned().collect()
	}

	/// Default event handler: log and drop.
	pub fn on_event(&self, method: &str, params: Value) {
		tracing::debug!(
			guid = %self.guid,
			type_name = %self.type_name,
			method,
			?params,
			"unhandled event"
		);
	}

	pub fn was_collected(&self) -> bool {
		self.was_collected.load(Ordering::SeqCst)
	}
}
