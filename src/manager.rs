// src/manager.rs

use crate::backend::{MessagingBackend, RuntimeBackend};
use crate::context::{Context, ContextInner};
use crate::error::LifecycleError;
use crate::lifecycle::HandleState;
use crate::options::{ContextOptions, TeardownPolicy};
use crate::runtime::event_bus::DEFAULT_EVENT_BUS_CAPACITY;
use crate::runtime::{EventBus, LifecycleEvent};
use crate::socket::{IntoSocketType, Socket};

use std::fmt;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tokio::sync::broadcast::Receiver;

/// Settings a manager applies to every context it opens.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
  /// Options used by `open_context()`.
  pub defaults: ContextOptions,
  /// How `close_context` treats sockets that are still open.
  pub policy: TeardownPolicy,
  /// Capacity of the lifecycle event bus.
  pub event_capacity: usize,
}

impl Default for ManagerConfig {
  fn default() -> Self {
    Self {
      defaults: ContextOptions::default(),
      policy: TeardownPolicy::default(),
      event_capacity: DEFAULT_EVENT_BUS_CAPACITY,
    }
  }
}

/// Creates, tracks and tears down messaging contexts and their sockets in
/// dependency order.
///
/// Teardown is always innermost-first: sockets are closed before the context
/// that owns them. `close_context` on a context with open sockets follows the
/// manager's `TeardownPolicy`, and every context opened by one manager uses the
/// same policy.
///
/// The manager is `Send + Sync`; contexts it opens are independent of each other.
pub struct LifecycleManager {
  config: ManagerConfig,
  backend: Arc<dyn MessagingBackend>,
  event_bus: EventBus,
  next_handle: Arc<AtomicUsize>,
  contexts: Mutex<Vec<Weak<ContextInner>>>,
}

impl LifecycleManager {
  /// A manager with default configuration on the default `RuntimeBackend`.
  pub fn new() -> Self {
    Self::with_config(ManagerConfig::default())
  }

  pub fn with_config(config: ManagerConfig) -> Self {
    Self::with_backend(config, Arc::new(RuntimeBackend::new()))
  }

  /// A manager that drives a custom messaging backend.
  pub fn with_backend(config: ManagerConfig, backend: Arc<dyn MessagingBackend>) -> Self {
    tracing::debug!(policy = ?config.policy, "Creating LifecycleManager");
    let event_bus = EventBus::with_capacity(config.event_capacity);
    Self {
      config,
      backend,
      event_bus,
      next_handle: Arc::new(AtomicUsize::new(1)), // Start handle IDs from 1.
      contexts: Mutex::new(Vec::new()),
    }
  }

  pub fn config(&self) -> &ManagerConfig {
    &self.config
  }

  pub fn teardown_policy(&self) -> TeardownPolicy {
    self.config.policy
  }

  /// Opens a context with the manager's default options.
  ///
  /// Fails with `ResourceExhausted` if the backend cannot allocate its runtime.
  pub fn open_context(&self) -> Result<Context, LifecycleError> {
    self.open_context_with(self.config.defaults.clone())
  }

  /// Opens a context with explicit options.
  pub fn open_context_with(&self, options: ContextOptions) -> Result<Context, LifecycleError> {
    let inner = ContextInner::open(
      self.next_handle.clone(),
      self.backend.clone(),
      options,
      self.config.policy,
      self.event_bus.clone(),
    )?;
    let mut contexts = self.contexts.lock();
    contexts.retain(|weak| weak.strong_count() > 0);
    contexts.push(Arc::downgrade(&inner));
    Ok(Context::from_inner(inner))
  }

  /// Creates a socket of `pattern` owned by `context`.
  pub fn open_socket(&self, context: &Context, pattern: impl IntoSocketType) -> Result<Socket, LifecycleError> {
    context.socket(pattern)
  }

  /// Closes `socket`. A second close returns the non-fatal `AlreadyClosed`.
  pub fn close_socket(&self, socket: &Socket) -> Result<(), LifecycleError> {
    socket.close()
  }

  /// Closes `context` under the manager's teardown policy.
  pub fn close_context(&self, context: &Context) -> Result<(), LifecycleError> {
    context.close()
  }

  /// Number of contexts opened by this manager that are still open.
  pub fn open_context_count(&self) -> usize {
    // Upgraded handles are dropped after the lock is released; the last one may run a context teardown.
    let live: Vec<Arc<ContextInner>> = self.contexts.lock().iter().filter_map(Weak::upgrade).collect();
    live
      .iter()
      .filter(|inner| inner.state.read().get() == HandleState::Open)
      .count()
  }

  /// Subscribes to lifecycle events of every context opened by this manager.
  pub fn subscribe(&self) -> Receiver<LifecycleEvent> {
    self.event_bus.subscribe()
  }
}

impl Default for LifecycleManager {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for LifecycleManager {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LifecycleManager")
      .field("config", &self.config)
      .field("open_contexts", &self.open_context_count())
      .finish_non_exhaustive()
  }
}

static DEFAULT_MANAGER: Lazy<LifecycleManager> = Lazy::new(LifecycleManager::new);

/// The process-wide manager used by `rzmq_lifecycle::context()`.
pub fn default_manager() -> &'static LifecycleManager {
  &DEFAULT_MANAGER
}
