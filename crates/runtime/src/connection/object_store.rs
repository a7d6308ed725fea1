//! Thread-safe object registry with per-guid notification.
//!
//! Lookups race object creation: a response can reference a guid whose
//! `__create__` event is still in flight. [`ObjectStore::wait_for`] registers
//! its waiter before checking the map, so an insert between check and wait
//! cannot be missed.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Notify;

use crate::channel_owner::ChannelOwner;
use crate::error::{Error, Result};

/// Registry of live protocol objects keyed by guid.
pub struct ObjectStore {
	objects: DashMap<Arc<str>, Arc<dyn ChannelOwner>>,
	waiters: DashMap<Arc<str>, Arc<Notify>>,
}

impl Default for ObjectStore {
	fn default() -> Self {
		Self::new()
	}
}

impl ObjectStore {
	pub fn new() -> Self {
		Self {
			objects: DashMap::new(),
			waiters: DashMap::new(),
		}
	}

	/// Inserts an object and wakes any waiters for its guid.
	pub fn insert(&self, guid: Arc<str>, object: Arc<dyn ChannelOwner>) {
		self.objects.insert(guid.clone(), object);
		if let Some((_, notify)) = self.waiters.remove(&guid) {
			notify.notify_waiters();
		}
	}

	pub fn remove(&self, guid: &str) {
		self.objects.remove(&Arc::from(guid) as &Arc<str>);
	}

	/// Synchronous lookup.
	pub fn try_get(&self, guid: &str) -> Option<Arc<dyn ChannelOwner>> {
		self.objects
			.get(&Arc::from(guid) as &Arc<str>)
			.map(|r| r.value().clone())
	}

	/// Waits until an object is registered, up to `timeout`.
	pub async fn wait_for(&self, guid: &str, timeout: Duration) -> Result<Arc<dyn ChannelOwner>> {
		let g: Arc<str> = Arc::from(guid);
		let deadline = tokio::time::Instant::now() + timeout;

		loop {
			// Waiter first, then check, so a concurrent insert always lands
			// on a registered Notify.
			let notify = self
				.waiters
				.entry(g.clone())
				.or_insert_with(|| Arc::new(Notify::new()))
				.clone();
			let notified = notify.notified();

			if let Some(object) = self.objects.get(&g) {
				return Ok(object.value().clone());
			}

			let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
			if remaining.is_zero() {
				return Err(Self::timeout_error(&g));
			}

			tokio::select! {
				biased;
				_ = notified => {}
				_ = tokio::time::sleep(remaining) => {
					return Err(Self::timeout_error(&g));
				}
			}
		}
	}

	fn timeout_error(guid: &str) -> Error {
		let target_type = match () {
			_ if guid.starts_with("page@") => "Page",
			_ if guid.starts_with("frame@") => "Frame",
			_ if guid.starts_with("browser-context@") => "BrowserContext",
			_ if guid.starts_with("browser@") => "Browser",
			_ if guid.starts_with("request@") => "Request",
			_ if guid.starts_with("response@") => "Response",
			_ if guid.starts_with("route@") => "Route",
			_ if guid.starts_with("dialog@") => "Dialog",
			_ if guid.starts_with("artifact@") => "Artifact",
			_ => return Error::Timeout(format!("Timeout waiting for object: {guid}")),
		};
		Error::Timeout(format!("Timeout waiting for {target_type} object: {guid}"))
	}
}

#[cfg(test)]
mod store_tests {
	use super::*;

	#[test]
	fn timeout_error_names_known_prefixes() {
		let error = ObjectStore::timeout_error("page@123");
		assert!(error.to_string().contains("Page object: page@123"));

		let error = ObjectStore::timeout_error("mystery@1");
		assert!(error.to_string().contains("Timeout waiting for object: mystery@1"));
	}

	#[tokio::test]
	async fn wait_for_returns_error_after_deadline() {
		let store = ObjectStore::new();
		let result = store.wait_for("page@missing", Duration::from_millis(20)).await;
		assert!(result.is_err());
		assert!(result.unwrap_err().is_timeout());
	}
}
