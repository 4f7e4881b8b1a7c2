// src/backend/runtime.rs

use super::{MessagingBackend, RawContext, RawSocket};
use crate::error::LifecycleError;
use crate::options::ContextOptions;
use crate::socket::SocketType;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};

/// Number of backend runtimes alive in this process, across all backends.
static LIVE_RUNTIMES: AtomicUsize = AtomicUsize::new(0);

/// Returns how many context runtimes are currently alive in the process.
pub fn live_runtimes() -> usize {
  LIVE_RUNTIMES.load(Ordering::Acquire)
}

struct RuntimeContext {
  runtime: Runtime,
  sockets: HashMap<u64, SocketType>,
  blocky: bool,
  linger: Duration,
}

#[derive(Default)]
struct BackendState {
  contexts: HashMap<u64, RuntimeContext>,
  /// Socket token -> owning context token.
  socket_owner: HashMap<u64, u64>,
}

/// Default backend. Each context gets its own Tokio runtime whose worker
/// threads stand in for the messaging library's I/O threads.
pub struct RuntimeBackend {
  next_token: AtomicU64,
  state: Mutex<BackendState>,
}

impl RuntimeBackend {
  pub fn new() -> Self {
    Self {
      next_token: AtomicU64::new(1),
      state: Mutex::new(BackendState::default()),
    }
  }

  /// Number of contexts this backend currently holds.
  pub fn live_contexts(&self) -> usize {
    self.state.lock().contexts.len()
  }

  /// Number of sockets this backend currently holds, across all contexts.
  pub fn live_sockets(&self) -> usize {
    self.state.lock().socket_owner.len()
  }

  /// Handle to the runtime backing `context`, for spawning I/O work onto its threads.
  pub fn runtime_handle(&self, context: RawContext) -> Option<Handle> {
    self
      .state
      .lock()
      .contexts
      .get(&context.token())
      .map(|ctx| ctx.runtime.handle().clone())
  }

  fn next_token(&self) -> u64 {
    self.next_token.fetch_add(1, Ordering::Relaxed)
  }

  fn build_runtime(options: &ContextOptions) -> Result<Runtime, LifecycleError> {
    let mut builder = if options.io_threads == 0 {
      // No I/O threads: the runtime only drives work from the calling thread.
      Builder::new_current_thread()
    } else {
      let mut b = Builder::new_multi_thread();
      b.worker_threads(options.io_threads);
      b
    };
    let prefix = options.thread_name_prefix.clone();
    let thread_seq = Arc::new(AtomicUsize::new(0));
    builder
      .thread_name_fn(move || format!("{}-io-{}", prefix, thread_seq.fetch_add(1, Ordering::Relaxed)))
      .enable_time();
    // Tokio panics instead of returning an error when a worker thread cannot be spawned.
    map_build_result(panic::catch_unwind(AssertUnwindSafe(|| builder.build())))
  }

  fn stop_runtime(runtime: Runtime, blocky: bool, linger: Duration) {
    // Blocking shutdown is not allowed from inside another runtime.
    if !blocky || Handle::try_current().is_ok() {
      runtime.shutdown_background();
    } else {
      runtime.shutdown_timeout(linger);
    }
    LIVE_RUNTIMES.fetch_sub(1, Ordering::AcqRel);
  }
}

/// Maps the outcome of building a runtime, including a worker spawn panic, to a lifecycle result.
fn map_build_result(result: std::thread::Result<io::Result<Runtime>>) -> Result<Runtime, LifecycleError> {
  match result {
    Ok(Ok(runtime)) => Ok(runtime),
    Ok(Err(e)) => Err(LifecycleError::from_io(e, "starting context I/O threads")),
    Err(payload) => {
      let reason = panic_message(payload.as_ref());
      tracing::error!(%reason, "Backend runtime failed to start its I/O threads");
      Err(LifecycleError::ResourceExhausted(format!(
        "starting context I/O threads: {}",
        reason
      )))
    }
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&'static str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "worker thread spawn panicked".to_string()
  }
}

impl Default for RuntimeBackend {
  fn default() -> Self {
    Self::new()
  }
}

impl MessagingBackend for RuntimeBackend {
  fn create_context(&self, options: &ContextOptions) -> Result<RawContext, LifecycleError> {
    // Rejects io_threads counts that would exhaust the process before any thread is spawned.
    options.validate()?;
    let runtime = Self::build_runtime(options)?;
    let token = self.next_token();
    LIVE_RUNTIMES.fetch_add(1, Ordering::AcqRel);
    self.state.lock().contexts.insert(
      token,
      RuntimeContext {
        runtime,
        sockets: HashMap::new(),
        blocky: options.blocky,
        linger: options.linger,
      },
    );
    tracing::debug!(
      raw_context = token,
      io_threads = options.io_threads,
      "Backend runtime started"
    );
    Ok(RawContext::new(token))
  }

  fn create_socket(&self, context: RawContext, socket_type: SocketType) -> Result<RawSocket, LifecycleError> {
    let token = self.next_token();
    let mut state = self.state.lock();
    let ctx = state
      .contexts
      .get_mut(&context.token())
      .ok_or(LifecycleError::InvalidContext("backend has no such context"))?;
    ctx.sockets.insert(token, socket_type);
    state.socket_owner.insert(token, context.token());
    tracing::trace!(raw_context = context.token(), raw_socket = token, %socket_type, "Backend socket created");
    Ok(RawSocket::new(token))
  }

  fn close_socket(&self, socket: RawSocket) -> Result<(), LifecycleError> {
    let mut state = self.state.lock();
    let owner = state
      .socket_owner
      .remove(&socket.token())
      .ok_or(LifecycleError::InvalidState("backend has no such socket"))?;
    if let Some(ctx) = state.contexts.get_mut(&owner) {
      ctx.sockets.remove(&socket.token());
    }
    tracing::trace!(raw_context = owner, raw_socket = socket.token(), "Backend socket closed");
    Ok(())
  }

  fn destroy_context(&self, context: RawContext) -> Result<(), LifecycleError> {
    let ctx = {
      let mut state = self.state.lock();
      match state.contexts.get(&context.token()) {
        None => return Err(LifecycleError::InvalidContext("backend has no such context")),
        Some(ctx) if !ctx.sockets.is_empty() => {
          return Err(LifecycleError::SocketsStillOpen {
            count: ctx.sockets.len(),
          })
        }
        Some(_) => {}
      }
      state.contexts.remove(&context.token())
    };
    // Shut down outside the lock; a blocky shutdown may wait for `linger`.
    if let Some(ctx) = ctx {
      Self::stop_runtime(ctx.runtime, ctx.blocky, ctx.linger);
      tracing::debug!(raw_context = context.token(), "Backend runtime stopped");
    }
    Ok(())
  }
}

impl Drop for RuntimeBackend {
  fn drop(&mut self) {
    let state = std::mem::take(self.state.get_mut());
    if !state.contexts.is_empty() {
      tracing::warn!(contexts = state.contexts.len(), "RuntimeBackend dropped with live contexts");
    }
    for (_, ctx) in state.contexts {
      ctx.runtime.shutdown_background();
      LIVE_RUNTIMES.fetch_sub(1, Ordering::AcqRel);
    }
  }
}

impl fmt::Debug for RuntimeBackend {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.lock();
    f.debug_struct("RuntimeBackend")
      .field("contexts", &state.contexts.len())
      .field("sockets", &state.socket_owner.len())
      .finish()
  }
}
