// tests/common.rs
#![allow(dead_code)] // Not every test binary uses every helper

use rzmq_lifecycle::{
  ContextOptions, LifecycleError, LifecycleManager, ManagerConfig, MessagingBackend, RawContext, RawSocket,
  RuntimeBackend, SocketType, TeardownPolicy,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use parking_lot::Mutex;

static TRACING_INIT: Once = Once::new();

// Setup function to initialize tracing
pub fn setup_tracing() {
  TRACING_INIT.call_once(|| {
    // Can be overridden by RUST_LOG env variable
    let default_filter = "rzmq_lifecycle=debug,warn";
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
      .with_env_filter(env_filter)
      .with_target(true)
      .with_line_number(true)
      .with_test_writer() // Write to test output capture
      .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global tracing subscriber");
  });
}

/// Small, fast-to-tear-down context options for tests.
pub fn test_options() -> ContextOptions {
  ContextOptions {
    io_threads: 1,
    linger: Duration::from_millis(50),
    thread_name_prefix: "lifecycle-test".into(),
    ..ContextOptions::default()
  }
}

pub fn test_config(policy: TeardownPolicy) -> ManagerConfig {
  ManagerConfig {
    defaults: test_options(),
    policy,
    ..ManagerConfig::default()
  }
}

// Helper to create a manager on the default runtime backend
pub fn test_manager(policy: TeardownPolicy) -> LifecycleManager {
  setup_tracing();
  LifecycleManager::with_config(test_config(policy))
}

/// Manager on a `FaultyBackend`, returning both so tests can flip faults and inspect calls.
pub fn faulty_manager(policy: TeardownPolicy) -> (LifecycleManager, Arc<FaultyBackend>) {
  setup_tracing();
  let backend = Arc::new(FaultyBackend::default());
  let manager = LifecycleManager::with_backend(test_config(policy), backend.clone());
  (manager, backend)
}

/// One call that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
  CreateContext,
  CreateSocket(RawContext, SocketType),
  CloseSocket(RawSocket),
  DestroyContext(RawContext),
}

/// Wraps `RuntimeBackend`, recording every call and failing on demand.
/// Failures of close/destroy happen *after* the real release so no runtime leaks.
#[derive(Default)]
pub struct FaultyBackend {
  inner: RuntimeBackend,
  pub fail_create_context: AtomicBool,
  pub fail_create_socket: AtomicBool,
  pub fail_close_socket: AtomicBool,
  pub fail_destroy_context: AtomicBool,
  calls: Mutex<Vec<BackendCall>>,
}

impl FaultyBackend {
  pub fn calls(&self) -> Vec<BackendCall> {
    self.calls.lock().clone()
  }

  pub fn live_contexts(&self) -> usize {
    self.inner.live_contexts()
  }

  pub fn live_sockets(&self) -> usize {
    self.inner.live_sockets()
  }

  fn record(&self, call: BackendCall) {
    self.calls.lock().push(call);
  }
}

impl MessagingBackend for FaultyBackend {
  fn create_context(&self, options: &ContextOptions) -> Result<RawContext, LifecycleError> {
    self.record(BackendCall::CreateContext);
    if self.fail_create_context.load(Ordering::SeqCst) {
      return Err(LifecycleError::from_io(
        io::Error::from_raw_os_error(libc::EMFILE),
        "starting context I/O threads",
      ));
    }
    self.inner.create_context(options)
  }

  fn create_socket(&self, context: RawContext, socket_type: SocketType) -> Result<RawSocket, LifecycleError> {
    self.record(BackendCall::CreateSocket(context, socket_type));
    if self.fail_create_socket.load(Ordering::SeqCst) {
      return Err(LifecycleError::from_io(
        io::Error::from_raw_os_error(libc::ENOMEM),
        "allocating socket",
      ));
    }
    self.inner.create_socket(context, socket_type)
  }

  fn close_socket(&self, socket: RawSocket) -> Result<(), LifecycleError> {
    self.record(BackendCall::CloseSocket(socket));
    self.inner.close_socket(socket)?;
    if self.fail_close_socket.load(Ordering::SeqCst) {
      return Err(LifecycleError::Io(io::Error::new(io::ErrorKind::Other, "injected close failure")));
    }
    Ok(())
  }

  fn destroy_context(&self, context: RawContext) -> Result<(), LifecycleError> {
    self.record(BackendCall::DestroyContext(context));
    self.inner.destroy_context(context)?;
    if self.fail_destroy_context.load(Ordering::SeqCst) {
      return Err(LifecycleError::Io(io::Error::new(io::ErrorKind::Other, "injected destroy failure")));
    }
    Ok(())
  }
}
