// src/context.rs

use crate::backend::{MessagingBackend, RawContext};
use crate::error::LifecycleError;
use crate::lifecycle::{HandleState, StateCell};
use crate::options::{self, parse_i32_option, ContextOptions, TeardownPolicy};
use crate::runtime::{EventBus, LifecycleEvent};
use crate::socket::core::SocketCore;
use crate::socket::{IntoSocketType, Socket, SocketType};

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

/// Holds the internal state shared by multiple `Context` handles.
///
/// Lock order: `state` -> socket state -> `sockets` -> `options`.
pub(crate) struct ContextInner {
  pub(crate) handle: usize,
  /// `close_context` takes this for writing; socket open/close take it for reading.
  pub(crate) state: RwLock<StateCell>,
  /// Map of open socket handles. Owns the sockets; they only point back weakly.
  pub(crate) sockets: RwLock<HashMap<usize, Arc<SocketCore>>>,
  /// Source for socket handle IDs, shared with the manager.
  next_handle: Arc<AtomicUsize>,
  /// Set by `shutdown()`; no new sockets afterwards.
  shutdown_initiated: AtomicBool,
  options: Mutex<ContextOptions>,
  policy: TeardownPolicy,
  raw: RawContext,
  pub(crate) backend: Arc<dyn MessagingBackend>,
  pub(crate) event_bus: EventBus,
}

impl ContextInner {
  /// Acquires backend resources and returns an open context.
  /// Nothing is left behind if the backend fails.
  pub(crate) fn open(
    next_handle: Arc<AtomicUsize>,
    backend: Arc<dyn MessagingBackend>,
    options: ContextOptions,
    policy: TeardownPolicy,
    event_bus: EventBus,
  ) -> Result<Arc<Self>, LifecycleError> {
    options.validate()?;
    let handle = next_handle.fetch_add(1, AtomicOrdering::Relaxed);
    let mut state = StateCell::new();
    let raw = backend.create_context(&options)?;
    state.open()?;

    tracing::info!(
      context_id = handle,
      io_threads = options.io_threads,
      max_sockets = options.max_sockets,
      ?policy,
      "Context opened"
    );
    event_bus.publish(LifecycleEvent::ContextOpened { context_id: handle });

    Ok(Arc::new(Self {
      handle,
      state: RwLock::new(state),
      sockets: RwLock::new(HashMap::new()),
      next_handle,
      shutdown_initiated: AtomicBool::new(false),
      options: Mutex::new(options),
      policy,
      raw,
      backend,
      event_bus,
    }))
  }

  fn open_socket(self: &Arc<Self>, socket_type: SocketType) -> Result<Arc<SocketCore>, LifecycleError> {
    let ctx_state = self.state.read();
    if !ctx_state.is_open() {
      return Err(LifecycleError::InvalidContext("context is closed"));
    }
    if self.shutdown_initiated.load(AtomicOrdering::Acquire) {
      return Err(LifecycleError::InvalidContext("context is shutting down"));
    }

    // Held across the backend call so the MAX_SOCKETS check cannot race.
    let mut sockets_w = self.sockets.write();
    let max_sockets = self.options.lock().max_sockets;
    if sockets_w.len() >= max_sockets {
      return Err(LifecycleError::ResourceExhausted(format!(
        "context {} reached MAX_SOCKETS ({})",
        self.handle, max_sockets
      )));
    }

    let handle = self.next_handle.fetch_add(1, AtomicOrdering::Relaxed);
    let mut socket_state = StateCell::new();
    let raw = self.backend.create_socket(self.raw, socket_type)?;
    socket_state.open()?;
    let core = Arc::new(SocketCore::new(handle, socket_type, self, socket_state, raw));
    sockets_w.insert(handle, core.clone());
    drop(sockets_w);
    drop(ctx_state);

    tracing::debug!(context_id = self.handle, socket_id = handle, %socket_type, "Socket opened");
    self.event_bus.publish(LifecycleEvent::SocketOpened {
      context_id: self.handle,
      socket_id: handle,
      socket_type,
    });
    Ok(core)
  }

  fn shutdown(&self) -> Result<(), LifecycleError> {
    if !self.state.read().is_open() {
      return Err(LifecycleError::InvalidContext("context is closed"));
    }
    if self
      .shutdown_initiated
      .compare_exchange(false, true, AtomicOrdering::AcqRel, AtomicOrdering::Acquire)
      .is_ok()
    {
      tracing::info!(context_id = self.handle, "Context shutdown initiated.");
      self.event_bus.publish(LifecycleEvent::ContextShutdown { context_id: self.handle });
    } else {
      tracing::debug!(context_id = self.handle, "Context shutdown already initiated.");
    }
    Ok(())
  }

  fn close(&self) -> Result<(), LifecycleError> {
    let mut state = self.state.write();
    if !state.is_open() {
      return state.close();
    }

    let open_sockets: Vec<Arc<SocketCore>> = self.sockets.read().values().cloned().collect();
    if !open_sockets.is_empty() && self.policy == TeardownPolicy::Reject {
      tracing::debug!(
        context_id = self.handle,
        open_sockets = open_sockets.len(),
        "Refusing to close context with open sockets"
      );
      return Err(LifecycleError::SocketsStillOpen {
        count: open_sockets.len(),
      });
    }

    let mut first_error = None;
    for socket in &open_sockets {
      if let Err(e) = socket.release(true) {
        first_error.get_or_insert(e);
      }
    }
    self.sockets.write().clear();

    state.close()?;
    drop(state);
    if let Err(e) = self.backend.destroy_context(self.raw) {
      tracing::warn!(context_id = self.handle, error = %e, "Backend failed to destroy context; handle marked closed");
      first_error.get_or_insert(e);
    }
    tracing::info!(context_id = self.handle, "Context closed");
    self.event_bus.publish(LifecycleEvent::ContextClosed { context_id: self.handle });

    match first_error {
      Some(e) => Err(e),
      None => Ok(()),
    }
  }

  fn set_option(&self, option: i32, value: i32) -> Result<(), LifecycleError> {
    if !self.state.read().is_open() {
      return Err(LifecycleError::InvalidContext("context is closed"));
    }
    match option {
      // Both were consumed when the backend runtime started.
      options::IO_THREADS | options::BLOCKY => {
        Err(LifecycleError::InvalidState("option is fixed once the context is open"))
      }
      options::MAX_SOCKETS => {
        let sockets_r = self.sockets.read();
        let mut opts = self.options.lock();
        let requested = usize::try_from(value).map_err(|_| LifecycleError::InvalidOptionValue(option))?;
        if requested < sockets_r.len() {
          return Err(LifecycleError::InvalidArgument(format!(
            "MAX_SOCKETS {} is below the {} sockets already open",
            requested,
            sockets_r.len()
          )));
        }
        opts.set(option, value)
      }
      _ => self.options.lock().set(option, value),
    }
  }

  fn get_option(&self, option: i32) -> Result<i32, LifecycleError> {
    if !self.state.read().is_open() {
      return Err(LifecycleError::InvalidContext("context is closed"));
    }
    self.options.lock().get(option)
  }
}

impl Drop for ContextInner {
  fn drop(&mut self) {
    let state = self.state.get_mut();
    if !state.is_open() {
      return;
    }
    // Drop cannot report errors, so teardown always force-closes.
    let sockets = std::mem::take(self.sockets.get_mut());
    if !sockets.is_empty() {
      tracing::warn!(
        context_id = self.handle,
        open_sockets = sockets.len(),
        "Last context handle dropped with open sockets; force-closing them"
      );
    }
    for socket in sockets.values() {
      let _ = socket.release(true);
    }
    let _ = state.close();
    if let Err(e) = self.backend.destroy_context(self.raw) {
      tracing::warn!(context_id = self.handle, error = %e, "Backend failed to destroy dropped context");
    }
    tracing::debug!(context_id = self.handle, "Dropped context released");
    self.event_bus.publish(LifecycleEvent::ContextClosed { context_id: self.handle });
  }
}

/// A handle to a messaging context: the runtime's I/O threads plus the
/// registry of sockets created from it.
///
/// `Context` handles are cloneable (`Arc`-based) and may be shared across
/// threads. Dropping the last handle of an open context force-closes its
/// remaining sockets and releases it. Drop ignores the `TeardownPolicy`:
/// even under `TeardownPolicy::Reject` the sockets are closed, since drop
/// cannot report `SocketsStillOpen`. Call `close()` to have the policy applied.
#[derive(Clone)]
pub struct Context {
  inner: Arc<ContextInner>,
}

impl Context {
  pub(crate) fn from_inner(inner: Arc<ContextInner>) -> Self {
    Self { inner }
  }

  /// Unique handle ID of this context.
  pub fn id(&self) -> usize {
    self.inner.handle
  }

  pub fn state(&self) -> HandleState {
    self.inner.state.read().get()
  }

  /// Teardown policy inherited from the manager that opened this context.
  pub fn teardown_policy(&self) -> TeardownPolicy {
    self.inner.policy
  }

  pub fn is_shutdown(&self) -> bool {
    self.inner.shutdown_initiated.load(AtomicOrdering::Acquire)
  }

  /// Number of sockets currently open on this context.
  pub fn open_socket_count(&self) -> usize {
    self.inner.sockets.read().len()
  }

  /// Creates a socket of the given pattern, owned by this context.
  ///
  /// Fails with `InvalidContext` once the context is closed or shutting down,
  /// `UnsupportedPattern` for unknown patterns, and `ResourceExhausted` when
  /// `MAX_SOCKETS` is reached. A failed call leaves the registry untouched.
  pub fn socket(&self, pattern: impl IntoSocketType) -> Result<Socket, LifecycleError> {
    let socket_type = pattern.into_socket_type()?;
    let core = self.inner.open_socket(socket_type)?;
    Ok(Socket::new(core))
  }

  /// Stops the context from accepting new sockets. Open sockets are unaffected
  /// and must still be closed before the context. Idempotent.
  pub fn shutdown(&self) -> Result<(), LifecycleError> {
    self.inner.shutdown()
  }

  /// Releases the context, applying its teardown policy to sockets that are still open.
  ///
  /// Closing an already-closed context returns `LifecycleError::AlreadyClosed`.
  pub fn close(&self) -> Result<(), LifecycleError> {
    self.inner.close()
  }

  /// Sets a numeric context option (see `rzmq_lifecycle::options`).
  pub fn set_option(&self, option: i32, value: i32) -> Result<(), LifecycleError> {
    self.inner.set_option(option, value)
  }

  /// Sets a numeric context option from its native-endian byte representation.
  pub fn set_option_raw(&self, option: i32, value: &[u8]) -> Result<(), LifecycleError> {
    self.set_option(option, parse_i32_option(option, value)?)
  }

  /// Reads a numeric context option.
  pub fn get_option(&self, option: i32) -> Result<i32, LifecycleError> {
    self.inner.get_option(option)
  }
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Context")
      .field("id", &self.inner.handle)
      .field("state", &self.state())
      .field("open_sockets", &self.open_socket_count())
      .finish_non_exhaustive()
  }
}

/// Opens a context from the process-wide default manager.
pub fn context() -> Result<Context, LifecycleError> {
  crate::manager::default_manager().open_context()
}
