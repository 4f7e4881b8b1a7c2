// src/lib.rs

//! rzmq_lifecycle - ordered, leak-free lifecycle management for ZeroMQ-style
//! messaging contexts and sockets.
//!
//! A [`LifecycleManager`] opens [`Context`]s; a context owns the [`Socket`]s
//! created from it. Sockets are always released before the context that owns
//! them, redundant closes are reported instead of double-freeing, and handles
//! that are dropped while still open release their resources on drop.
//!
//! ```
//! use rzmq_lifecycle::{LifecycleManager, SocketType};
//!
//! let manager = LifecycleManager::new();
//! let ctx = manager.open_context()?;
//! let requester = manager.open_socket(&ctx, SocketType::Req)?;
//! manager.close_socket(&requester)?;
//! manager.close_context(&ctx)?;
//! # Ok::<(), rzmq_lifecycle::LifecycleError>(())
//! ```

/// The boundary trait to the messaging library plus the default runtime-backed implementation.
pub mod backend;
/// Defines the `Context` handle and its socket registry.
pub mod context;
/// Defines the error type used throughout the library.
pub mod error;
/// The `Created -> Open -> Closed` handle state machine.
pub mod lifecycle;
/// The lifecycle manager and its configuration.
pub mod manager;
/// Numeric context options and their defaults.
pub mod options;
/// Lifecycle event bus.
pub mod runtime;
/// Socket types and the public `Socket` handle.
pub mod socket;

pub use backend::{MessagingBackend, RawContext, RawSocket, RuntimeBackend};
pub use context::{context, Context};
pub use error::LifecycleError;
pub use lifecycle::HandleState;
pub use manager::{default_manager, LifecycleManager, ManagerConfig};
pub use options::{ContextOptions, TeardownPolicy};
pub use runtime::{EventBus, LifecycleEvent};
pub use socket::{IntoSocketType, Socket, SocketType};

// Contexts are shared between threads; a socket must stay confined to one thread at a time.
static_assertions::assert_impl_all!(Context: Send, Sync, Clone);
static_assertions::assert_impl_all!(LifecycleManager: Send, Sync);
static_assertions::assert_impl_all!(Socket: Send);
static_assertions::assert_not_impl_any!(Socket: Sync, Clone);

// --- Top-Level Library Information Functions ---

/// Major version number of the rzmq_lifecycle library.
const VERSION_MAJOR: i32 = 0;
/// Minor version number of the rzmq_lifecycle library.
const VERSION_MINOR: i32 = 1;
/// Patch version number of the rzmq_lifecycle library.
const VERSION_PATCH: i32 = 0;

/// Returns the library version as a tuple (major, minor, patch).
///
/// # Examples
///
/// ```
/// let (major, minor, patch) = rzmq_lifecycle::version();
/// println!("rzmq_lifecycle version: {}.{}.{}", major, minor, patch);
/// ```
pub fn version() -> (i32, i32, i32) {
  (VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}
