// src/runtime/event_bus.rs

use super::system_events::LifecycleEvent;
use tokio::sync::broadcast::{self, Receiver, Sender};

pub(crate) const DEFAULT_EVENT_BUS_CAPACITY: usize = 256;

/// Broadcasts lifecycle events to any number of observers.
/// Internally uses tokio::sync::broadcast.
#[derive(Debug, Clone)]
pub struct EventBus {
  sender: Sender<LifecycleEvent>,
}

impl EventBus {
  /// Creates a new EventBus with default capacity.
  pub fn new() -> Self {
    Self::with_capacity(DEFAULT_EVENT_BUS_CAPACITY)
  }

  /// Creates a new EventBus with specific capacity.
  pub fn with_capacity(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity.max(1)); // Ensure capacity >= 1
    tracing::debug!(capacity = capacity.max(1), "Created new EventBus");
    Self { sender }
  }

  /// Publishes an event and returns how many subscribers received it.
  /// Having no subscribers is normal and yields 0.
  pub fn publish(&self, event: LifecycleEvent) -> usize {
    tracing::trace!(event = ?event, "Publishing event");
    self.sender.send(event).unwrap_or(0)
  }

  /// Creates a new receiver handle to subscribe to events from the bus.
  ///
  /// Each receiver sees the events published *after* it subscribed.
  /// A lagging receiver may miss events (see `tokio::sync::broadcast`).
  pub fn subscribe(&self) -> Receiver<LifecycleEvent> {
    tracing::trace!("Creating new event bus subscription");
    self.sender.subscribe()
  }

  /// Returns the number of active subscribers.
  pub fn subscriber_count(&self) -> usize {
    self.sender.receiver_count()
  }
}

impl Default for EventBus {
  fn default() -> Self {
    Self::new()
  }
}
