// src/runtime/system_events.rs

use crate::socket::SocketType;

/// Lifecycle transitions broadcast on a manager's `EventBus`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LifecycleEvent {
  /// A context acquired its backend resources.
  ContextOpened { context_id: usize },
  /// A socket was created and registered with its context.
  SocketOpened {
    context_id: usize,
    socket_id: usize,
    socket_type: SocketType,
  },
  /// A socket was released. `forced` is set when the context closed it during teardown.
  SocketClosed {
    context_id: usize,
    socket_id: usize,
    forced: bool,
  },
  /// The context stopped accepting new sockets.
  ContextShutdown { context_id: usize },
  /// The context released its backend resources.
  ContextClosed { context_id: usize },
}
