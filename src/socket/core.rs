// src/socket/core.rs

use crate::backend::{MessagingBackend, RawSocket};
use crate::context::ContextInner;
use crate::error::LifecycleError;
use crate::lifecycle::{HandleState, StateCell};
use crate::runtime::{EventBus, LifecycleEvent};
use crate::socket::types::SocketType;

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Shared state behind a `Socket` handle.
///
/// The owning context's registry holds the strong reference; `context` only
/// points back weakly so a socket never keeps its context alive.
pub(crate) struct SocketCore {
  pub(crate) handle: usize,
  pub(crate) socket_type: SocketType,
  pub(crate) context_id: usize,
  pub(crate) context: Weak<ContextInner>,
  state: Mutex<StateCell>,
  raw: RawSocket,
  backend: Arc<dyn MessagingBackend>,
  event_bus: EventBus,
}

impl SocketCore {
  /// Wraps a backend socket that was just created. `state` must already be `Open`.
  pub(crate) fn new(
    handle: usize,
    socket_type: SocketType,
    context: &Arc<ContextInner>,
    state: StateCell,
    raw: RawSocket,
  ) -> Self {
    debug_assert!(state.is_open());
    Self {
      handle,
      socket_type,
      context_id: context.handle,
      context: Arc::downgrade(context),
      state: Mutex::new(state),
      raw,
      backend: context.backend.clone(),
      event_bus: context.event_bus.clone(),
    }
  }

  pub(crate) fn state(&self) -> HandleState {
    self.state.lock().get()
  }

  /// User-initiated close: releases the socket and drops it from the context registry.
  pub(crate) fn close(&self) -> Result<(), LifecycleError> {
    let Some(ctx) = self.context.upgrade() else {
      // The context is gone, so its teardown already released every socket.
      return self.release(false);
    };
    // Hold the context state for reading so close_context cannot run concurrently.
    let _ctx_state = ctx.state.read();
    let result = self.release(false);
    if self.state() == HandleState::Closed {
      ctx.sockets.write().remove(&self.handle);
    }
    result
  }

  /// `Open -> Closed` plus the backend release. Does not touch the context registry.
  ///
  /// Once the transition happens it sticks, even if the backend fails; the
  /// backend error is still returned to the caller.
  pub(crate) fn release(&self, forced: bool) -> Result<(), LifecycleError> {
    let mut state = self.state.lock();
    state.close()?;
    let result = self.backend.close_socket(self.raw);
    drop(state);

    if let Err(e) = &result {
      tracing::warn!(socket_id = self.handle, error = %e, "Backend failed to close socket; handle marked closed");
    }
    if forced {
      tracing::warn!(
        context_id = self.context_id,
        socket_id = self.handle,
        socket_type = %self.socket_type,
        "Force-closed socket during context teardown"
      );
    } else {
      tracing::debug!(context_id = self.context_id, socket_id = self.handle, "Socket closed");
    }
    self.event_bus.publish(LifecycleEvent::SocketClosed {
      context_id: self.context_id,
      socket_id: self.handle,
      forced,
    });
    result
  }
}

impl fmt::Debug for SocketCore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SocketCore")
      .field("handle", &self.handle)
      .field("socket_type", &self.socket_type)
      .field("context_id", &self.context_id)
      .field("state", &self.state())
      .finish_non_exhaustive()
  }
}
