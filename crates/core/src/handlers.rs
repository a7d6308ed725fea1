//! Route handler registration and URL matching.
//!
//! Interception rules are stored per page in a [`HandlerMap`] keyed by a
//! globally unique [`HandlerId`], with [`IndexMap`] storage so dispatch can
//! honor registration order (last registered wins). [`Subscription`] is the
//! RAII side: dropping it unregisters the handler.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

/// Unique identifier for registered handlers.
pub type HandlerId = u64;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique handler ID.
pub fn next_handler_id() -> HandlerId {
	NEXT_HANDLER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Boxed async handler future.
pub type HandlerFuture = Pin<Box<dyn Future<Output = drover_runtime::Result<()>> + Send>>;

/// Handler function: `E` to async `Result<()>`.
pub type HandlerFn<E> = Arc<dyn Fn(E) -> HandlerFuture + Send + Sync>;

/// Handler entry with optional metadata `M` (a compiled matcher for routes).
pub struct HandlerEntry<E, M = ()> {
	pub id: HandlerId,
	pub meta: M,
	pub handler: HandlerFn<E>,
}

impl<E, M: Clone> Clone for HandlerEntry<E, M> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			meta: self.meta.clone(),
			handler: Arc::clone(&self.handler),
		}
	}
}

/// Handler storage: [`IndexMap`] keeps insertion order and removes in O(1).
pub type HandlerMap<E, M = ()> = Arc<Mutex<IndexMap<HandlerId, HandlerEntry<E, M>>>>;

/// Compiled glob pattern for URL matching.
#[derive(Clone)]
pub struct RouteMatcher {
	pattern: glob::Pattern,
}

impl RouteMatcher {
	/// Compiles a glob pattern, falling back to literal matching on invalid patterns.
	pub fn new(pattern: &str) -> Self {
		let pattern = glob::Pattern::new(pattern).unwrap_or_else(|_| {
			glob::Pattern::new(&glob::Pattern::escape(pattern))
				.expect("escaped pattern is always valid")
		});
		Self { pattern }
	}

	/// Returns `true` if the URL matches this pattern.
	pub fn is_match(&self, url: &str) -> bool {
		self.pattern.matches(url)
	}

	/// Returns the pattern string.
	pub fn as_str(&self) -> &str {
		self.pattern.as_str()
	}
}

impl std::fmt::Debug for RouteMatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("RouteMatcher").field(&self.as_str()).finish()
	}
}

/// Route handler metadata carrying the compiled [`RouteMatcher`].
#[derive(Clone)]
pub struct RouteMeta {
	pub matcher: RouteMatcher,
}

/// RAII handle that unregisters a handler on drop.
///
/// Holds only a weak reference to the handler map, so dropping after the
/// owning [`Page`](crate::Page) is gone is a no-op.
pub struct Subscription {
	id: HandlerId,
	dropper: Option<Arc<dyn Fn(HandlerId) + Send + Sync>>,
}

impl Subscription {
	/// Creates a subscription with a custom dropper function.
	pub fn new(id: HandlerId, dropper: Arc<dyn Fn(HandlerId) + Send + Sync>) -> Self {
		Self {
			id,
			dropper: Some(dropper),
		}
	}

	/// Creates a subscription bound to a handler map through a weak reference.
	pub fn from_handler_map<E, M>(id: HandlerId, handlers: &HandlerMap<E, M>) -> Self
	where
		E: Send + Sync + 'static,
		M: Send + Sync + 'static,
	{
		let weak: Weak<Mutex<IndexMap<HandlerId, HandlerEntry<E, M>>>> = Arc::downgrade(handlers);
		let dropper = Arc::new(move |id: HandlerId| {
			if let Some(map) = weak.upgrade() {
				map.lock().shift_remove(&id);
			}
		});
		Self::new(id, dropper)
	}

	/// Returns this subscription's handler ID.
	pub fn id(&self) -> HandlerId {
		self.id
	}

	/// Explicitly unsubscribes. Equivalent to dropping.
	pub fn unsubscribe(mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.dropper.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn handler_ids_increment() {
		let id1 = next_handler_id();
		let id2 = next_handler_id();
		assert!(id2 > id1);
	}

	#[test]
	fn matcher_glob_patterns() {
		let matcher = RouteMatcher::new("**/search*");
		assert!(matcher.is_match("http://127.0.0.1:5050/search?q=numb"));
		assert!(matcher.is_match("http://127.0.0.1:5050/api/search"));
		assert!(!matcher.is_match("http://127.0.0.1:5050/playlist"));
	}

	#[test]
	fn matcher_exact_urls() {
		let matcher = RouteMatcher::new("http://127.0.0.1:5050/playlist");
		assert!(matcher.is_match("http://127.0.0.1:5050/playlist"));
		assert!(!matcher.is_match("http://127.0.0.1:5050/playlist/2"));
	}

	#[test]
	fn matcher_invalid_pattern_falls_back_to_literal() {
		let matcher = RouteMatcher::new("http://host/[unclosed");
		assert!(matcher.is_match("http://host/[unclosed"));
		assert!(!matcher.is_match("http://host/other"));
	}

	#[test]
	fn subscription_unsubscribe_invokes_dropper() {
		use std::sync::atomic::{AtomicBool, Ordering};

		let called = Arc::new(AtomicBool::new(false));
		let called_clone = Arc::clone(&called);
		let dropper = Arc::new(move |_id: HandlerId| {
			called_clone.store(true, Ordering::SeqCst);
		});

		let sub = Subscription::new(1, dropper);
		assert!(!called.load(Ordering::SeqCst));
		sub.unsubscribe();
		assert!(called.load(Ordering::SeqCst));
	}

	#[test]
	fn subscription_drop_removes_handler() {
		let map: HandlerMap<String> = Arc::new(Mutex::new(IndexMap::new()));

		let id = next_handler_id();
		map.lock().insert(
			id,
			HandlerEntry {
				id,
				meta: (),
				handler: Arc::new(|_: String| Box::pin(async { Ok(()) })),
			},
		);
		assert_eq!(map.lock().len(), 1);

		{
			let _sub = Subscription::from_handler_map(id, &map);
		}

		assert_eq!(map.lock().len(), 0);
	}

	#[test]
	fn subscription_survives_dropped_map() {
		let map: HandlerMap<String> = Arc::new(Mutex::new(IndexMap::new()));

		let id = next_handler_id();
		map.lock().insert(
			id,
			HandlerEntry {
				id,
				meta: (),
				handler: Arc::new(|_: String| Box::pin(async { Ok(()) })),
			},
		);

		let sub = Subscription::from_handler_map(id, &map);
		drop(map);
		drop(sub);
	}
}
