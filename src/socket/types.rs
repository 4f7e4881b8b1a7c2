use crate::context::Context;
use crate::error::LifecycleError;
use crate::lifecycle::HandleState;
use crate::socket::core::SocketCore;

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

/// Represents the type of a ZeroMQ socket, i.e. its messaging pattern.
/// Discriminants match the `ZMQ_*` socket type constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketType {
  /// **PAIR:** Exclusive connection to exactly one peer.
  Pair = 0,
  /// **PUB (Publish):** Distributes messages to all connected subscribers.
  Pub = 1,
  /// **SUB (Subscribe):** Receives topic-filtered messages from publishers.
  Sub = 2,
  /// **REQ (Request):** Strictly alternating send/recv client.
  Req = 3,
  /// **REP (Reply):** Strictly alternating recv/send server.
  Rep = 4,
  /// **DEALER (Extended REQ):** Load-balances outgoing, fair-queues incoming.
  Dealer = 5,
  /// **ROUTER (Extended REP):** Routes by peer identity.
  Router = 6,
  /// **PULL:** Fair-queues from PUSH distributors.
  Pull = 7,
  /// **PUSH:** Round-robins to PULL workers.
  Push = 8,
  /// **XPUB:** PUB that exposes subscription messages.
  XPub = 9,
  /// **XSUB:** SUB that sends subscriptions as messages.
  XSub = 10,
  /// **STREAM:** Raw TCP peer.
  Stream = 11,
}

impl SocketType {
  /// Every socket type the lifecycle manager accepts, in `ZMQ_*` order.
  pub const ALL: [SocketType; 12] = [
    SocketType::Pair,
    SocketType::Pub,
    SocketType::Sub,
    SocketType::Req,
    SocketType::Rep,
    SocketType::Dealer,
    SocketType::Router,
    SocketType::Pull,
    SocketType::Push,
    SocketType::XPub,
    SocketType::XSub,
    SocketType::Stream,
  ];

  /// The canonical upper-case name, e.g. `"REQ"`.
  pub fn name(&self) -> &'static str {
    match self {
      SocketType::Pair => "PAIR",
      SocketType::Pub => "PUB",
      SocketType::Sub => "SUB",
      SocketType::Req => "REQ",
      SocketType::Rep => "REP",
      SocketType::Dealer => "DEALER",
      SocketType::Router => "ROUTER",
      SocketType::Pull => "PULL",
      SocketType::Push => "PUSH",
      SocketType::XPub => "XPUB",
      SocketType::XSub => "XSUB",
      SocketType::Stream => "STREAM",
    }
  }

  /// The `ZMQ_*` numeric identifier.
  pub fn as_raw(&self) -> i32 {
    *self as i32
  }
}

impl fmt::Display for SocketType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for SocketType {
  type Err = LifecycleError;

  fn from_str(s: &str) -> Result<Self, LifecycleError> {
    let upper = s.trim().to_ascii_uppercase();
    let name = upper.strip_prefix("ZMQ_").unwrap_or(&upper);
    Ok(match name {
      "PAIR" => SocketType::Pair,
      "PUB" | "PUBLISH" => SocketType::Pub,
      "SUB" | "SUBSCRIBE" => SocketType::Sub,
      "REQ" | "REQUEST" => SocketType::Req,
      "REP" | "REPLY" => SocketType::Rep,
      "DEALER" => SocketType::Dealer,
      "ROUTER" => SocketType::Router,
      "PULL" => SocketType::Pull,
      "PUSH" => SocketType::Push,
      "XPUB" => SocketType::XPub,
      "XSUB" => SocketType::XSub,
      "STREAM" => SocketType::Stream,
      _ => return Err(LifecycleError::UnsupportedPattern(s.to_string())),
    })
  }
}

impl TryFrom<i32> for SocketType {
  type Error = LifecycleError;

  fn try_from(raw: i32) -> Result<Self, LifecycleError> {
    SocketType::ALL
      .iter()
      .copied()
      .find(|t| t.as_raw() == raw)
      .ok_or_else(|| LifecycleError::UnsupportedPattern(raw.to_string()))
  }
}

/// Anything `open_socket` accepts as a pattern: a `SocketType`, its name, or its `ZMQ_*` number.
pub trait IntoSocketType {
  fn into_socket_type(self) -> Result<SocketType, LifecycleError>;
}

impl IntoSocketType for SocketType {
  fn into_socket_type(self) -> Result<SocketType, LifecycleError> {
    Ok(self)
  }
}

impl IntoSocketType for &str {
  fn into_socket_type(self) -> Result<SocketType, LifecycleError> {
    self.parse()
  }
}

impl IntoSocketType for &String {
  fn into_socket_type(self) -> Result<SocketType, LifecycleError> {
    self.parse()
  }
}

impl IntoSocketType for String {
  fn into_socket_type(self) -> Result<SocketType, LifecycleError> {
    self.parse()
  }
}

impl IntoSocketType for i32 {
  fn into_socket_type(self) -> Result<SocketType, LifecycleError> {
    SocketType::try_from(self)
  }
}

/// The public handle for one socket.
///
/// A `Socket` is owned by the context that created it; it only keeps a weak
/// back-reference to that context. The handle is `Send` but not `Sync` and not
/// `Clone`: a socket must not be driven from several threads at once, so callers
/// that need shared access must serialize it themselves (for example with a
/// `Mutex<Socket>`, or by confining the socket to one thread).
///
/// Dropping an open `Socket` closes it.
pub struct Socket {
  pub(crate) core: Arc<SocketCore>,
  _not_sync: PhantomData<Cell<()>>,
}

impl Socket {
  pub(crate) fn new(core: Arc<SocketCore>) -> Self {
    Self {
      core,
      _not_sync: PhantomData,
    }
  }

  /// Unique handle ID of this socket.
  pub fn id(&self) -> usize {
    self.core.handle
  }

  pub fn socket_type(&self) -> SocketType {
    self.core.socket_type
  }

  pub fn state(&self) -> HandleState {
    self.core.state()
  }

  /// ID of the context that created this socket.
  pub fn context_id(&self) -> usize {
    self.core.context_id
  }

  /// The owning context, or `None` once every handle to it has been dropped.
  pub fn context(&self) -> Option<Context> {
    self.core.context.upgrade().map(Context::from_inner)
  }

  /// Closes the socket and removes it from its context.
  ///
  /// Closing an already-closed socket returns `LifecycleError::AlreadyClosed`,
  /// which is non-fatal and changes nothing.
  pub fn close(&self) -> Result<(), LifecycleError> {
    self.core.close()
  }
}

impl Drop for Socket {
  fn drop(&mut self) {
    if self.core.state() != HandleState::Open {
      return;
    }
    tracing::debug!(socket_id = self.core.handle, "Open socket dropped, closing");
    match self.core.close() {
      Ok(()) | Err(LifecycleError::AlreadyClosed) => {}
      Err(e) => tracing::warn!(socket_id = self.core.handle, error = %e, "Closing dropped socket failed"),
    }
  }
}

impl fmt::Debug for Socket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Socket")
      .field("id", &self.core.handle)
      .field("socket_type", &self.core.socket_type)
      .field("state", &self.core.state())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_names_and_aliases() {
    assert_eq!("REQ".parse::<SocketType>().unwrap(), SocketType::Req);
    assert_eq!("REQUEST".parse::<SocketType>().unwrap(), SocketType::Req);
    assert_eq!("zmq_rep".parse::<SocketType>().unwrap(), SocketType::Rep);
    assert_eq!(" xpub ".parse::<SocketType>().unwrap(), SocketType::XPub);
  }

  #[test]
  fn unknown_name_is_unsupported_pattern() {
    let err = "UNKNOWN_PATTERN".parse::<SocketType>().unwrap_err();
    assert!(matches!(err, LifecycleError::UnsupportedPattern(ref p) if p == "UNKNOWN_PATTERN"));
  }

  #[test]
  fn raw_ids_follow_zmq_constants() {
    assert_eq!(SocketType::Req.as_raw(), 3);
    assert_eq!(SocketType::try_from(11).unwrap(), SocketType::Stream);
    assert!(matches!(SocketType::try_from(12), Err(LifecycleError::UnsupportedPattern(_))));
    for t in SocketType::ALL {
      assert_eq!(t.name().parse::<SocketType>().unwrap(), t);
      assert_eq!(SocketType::try_from(t.as_raw()).unwrap(), t);
    }
  }
}
