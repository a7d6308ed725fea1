//! Event bus for protocol events that support wait-and-trigger patterns.
//!
//! [`EventBus::emit`] delivers to registered waiters before broadcasting, so a
//! waiter installed before the triggering action can never miss its event.
//! This is what makes popup capture race-free: subscribe first, then click.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};

use drover_runtime::{Error, Result};

struct WaiterEntry<E> {
	predicate: Box<dyn Fn(&E) -> bool + Send + Sync>,
	complete_tx: oneshot::Sender<E>,
}

/// Event dispatcher combining a broadcast channel with one-shot waiters.
pub(crate) struct EventBus<E: Clone + Send + 'static> {
	tx: broadcast::Sender<E>,
	waiters: Mutex<Vec<WaiterEntry<E>>>,
}

impl<E: Clone + Send + 'static> EventBus<E> {
	/// Creates a new bus with the given broadcast capacity.
	pub fn new(capacity: usize) -> Self {
		let (tx, _) = broadcast::channel(capacity);
		Self {
			tx,
			waiters: Mutex::new(Vec::new()),
		}
	}

	/// Emits an event to matching waiters, then to broadcast subscribers.
	///
	/// Waiters are completed and removed before the broadcast so `wait_for`
	/// style callers get guaranteed delivery even when receivers lag.
	pub fn emit(&self, event: E) {
		{
			let mut waiters = self.waiters.lock();
			let mut i = 0;
			while i < waiters.len() {
				if (waiters[i].predicate)(&event) {
					let entry = waiters.swap_remove(i);
					let _ = entry.complete_tx.send(event.clone());
				} else {
					i += 1;
				}
			}
		}
		let _ = self.tx.send(event);
	}

	/// Subscribes to all future events.
	#[allow(dead_code)]
	pub fn subscribe(&self) -> broadcast::Receiver<E> {
		self.tx.subscribe()
	}

	/// Registers a one-shot waiter completed by the first matching event.
	pub fn register_waiter<F>(&self, predicate: F) -> oneshot::Receiver<E>
	where
		F: Fn(&E) -> bool + Send + Sync + 'static,
	{
		let (complete_tx, complete_rx) = oneshot::channel();
		self.waiters.lock().push(WaiterEntry {
			predicate: Box::new(predicate),
			complete_tx,
		});
		complete_rx
	}

	/// Returns the number of registered waiters.
	#[allow(dead_code)]
	pub fn waiter_count(&self) -> usize {
		self.waiters.lock().len()
	}
}

impl<E: Clone + Send + 'static> Default for EventBus<E> {
	fn default() -> Self {
		Self::new(256)
	}
}

/// One-shot event waiter with timeout support.
///
/// Returned by `expect_*` methods before the triggering action runs. Await
/// via [`wait`](Self::wait) for timeout enforcement, or `.await` directly.
pub struct EventWaiter<E> {
	rx: oneshot::Receiver<E>,
	timeout: Duration,
}

impl<E: Send + 'static> EventWaiter<E> {
	pub(crate) fn new(rx: oneshot::Receiver<E>, timeout: Duration) -> Self {
		Self { rx, timeout }
	}

	/// Waits for the event with the configured timeout.
	///
	/// # Errors
	///
	/// [`Error::Timeout`] when no matching event arrives in time,
	/// [`Error::ChannelClosed`] when the event source is dropped.
	pub async fn wait(self) -> Result<E> {
		tokio::time::timeout(self.timeout, self.rx)
			.await
			.map_err(|_| Error::Timeout("Timeout waiting for event".to_string()))?
			.map_err(|_| Error::ChannelClosed)
	}

	/// Returns the configured timeout.
	pub fn timeout(&self) -> Duration {
		self.timeout
	}
}

impl<E: Send + 'static> Future for EventWaiter<E> {
	type Output = Result<E>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(Ok(event)) => Poll::Ready(Ok(event)),
			Poll::Ready(Err(_)) => Poll::Ready(Err(Error::ChannelClosed)),
			Poll::Pending => Poll::Pending,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;

	#[derive(Clone, Debug, PartialEq)]
	struct TestEvent {
		id: u32,
	}

	#[tokio::test]
	async fn broadcast_reaches_all_subscribers() {
		let bus: EventBus<TestEvent> = EventBus::new(16);

		let mut rx1 = bus.subscribe();
		let mut rx2 = bus.subscribe();

		bus.emit(TestEvent { id: 1 });

		assert_eq!(rx1.recv().await.unwrap().id, 1);
		assert_eq!(rx2.recv().await.unwrap().id, 1);
	}

	#[tokio::test]
	async fn waiter_only_completes_on_matching_event() {
		let bus: EventBus<TestEvent> = EventBus::new(16);

		let mut rx = bus.register_waiter(|e| e.id == 2);
		bus.emit(TestEvent { id: 1 });
		assert!(rx.try_recv().is_err());

		let rx = bus.register_waiter(|e| e.id == 2);
		bus.emit(TestEvent { id: 2 });
		assert_eq!(rx.await.unwrap().id, 2);
	}

	#[tokio::test]
	async fn waiter_removed_after_match() {
		let bus: EventBus<TestEvent> = EventBus::new(16);

		let _rx = bus.register_waiter(|e| e.id == 1);
		assert_eq!(bus.waiter_count(), 1);

		bus.emit(TestEvent { id: 1 });
		assert_eq!(bus.waiter_count(), 0);
	}

	#[tokio::test]
	async fn waiter_registered_before_emit_never_misses() {
		let bus = Arc::new(EventBus::<TestEvent>::new(16));

		let rx = bus.register_waiter(|_| true);
		let waiter = EventWaiter::new(rx, Duration::from_secs(1));

		let bus_clone = Arc::clone(&bus);
		tokio::spawn(async move {
			bus_clone.emit(TestEvent { id: 7 });
		});

		assert_eq!(waiter.wait().await.unwrap().id, 7);
	}

	#[tokio::test]
	async fn waiter_times_out_without_event() {
		let (_tx, rx) = oneshot::channel::<TestEvent>();
		let waiter = EventWaiter::new(rx, Duration::from_millis(10));

		assert!(matches!(waiter.wait().await, Err(Error::Timeout(_))));
	}
}
