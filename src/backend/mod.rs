// src/backend/mod.rs

//! The boundary to the messaging library that owns the real resources.
//!
//! The lifecycle core only ever calls the four capabilities of
//! [`MessagingBackend`]. Message I/O, framing and transports stay on the
//! backend's side of the boundary.

pub mod runtime;

pub use runtime::{live_runtimes, RuntimeBackend};

use crate::error::LifecycleError;
use crate::options::ContextOptions;
use crate::socket::SocketType;

/// Opaque backend token for a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawContext(u64);

impl RawContext {
  pub fn new(token: u64) -> Self {
    Self(token)
  }

  pub fn token(&self) -> u64 {
    self.0
  }
}

/// Opaque backend token for a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSocket(u64);

impl RawSocket {
  pub fn new(token: u64) -> Self {
    Self(token)
  }

  pub fn token(&self) -> u64 {
    self.0
  }
}

/// Capability set of the external messaging library.
///
/// Every call is fallible and may block briefly on OS allocation. The lifecycle
/// manager guarantees the calls arrive in a valid order: a socket is closed
/// before its context is destroyed and no token is used after release.
pub trait MessagingBackend: Send + Sync + 'static {
  /// Allocates the runtime context (I/O threads, socket table).
  fn create_context(&self, options: &ContextOptions) -> Result<RawContext, LifecycleError>;

  /// Creates a socket of `socket_type` inside `context`.
  fn create_socket(&self, context: RawContext, socket_type: SocketType) -> Result<RawSocket, LifecycleError>;

  /// Releases a socket.
  fn close_socket(&self, socket: RawSocket) -> Result<(), LifecycleError>;

  /// Releases a context. All of its sockets have been closed.
  fn destroy_context(&self, context: RawContext) -> Result<(), LifecycleError>;
}
