// src/error.rs

use std::io;
use thiserror::Error;

/// Errors produced by lifecycle operations on contexts and sockets.
#[derive(Error, Debug)]
#[non_exhaustive] // Allows adding more variants later without breaking change
pub enum LifecycleError {
  // --- Resource Errors ---
  #[error("Resource exhausted: {0}")]
  ResourceExhausted(String), // EMFILE / ENOMEM / thread spawn failure / MAX_SOCKETS

  // --- Handle Errors ---
  #[error("Context is no longer usable: {0}")]
  InvalidContext(&'static str), // ETERM / EFAULT on a destroyed context
  #[error("Unsupported socket pattern: {0}")]
  UnsupportedPattern(String), // EINVAL on zmq_socket type
  #[error("Operation is invalid for the current handle state: {0}")]
  InvalidState(&'static str), // EFSM
  #[error("Context still owns {count} open socket(s)")]
  SocketsStillOpen { count: usize },
  #[error("Handle is already closed")]
  AlreadyClosed,

  // --- Option Errors ---
  #[error("Invalid context option ID: {0}")]
  InvalidOption(i32),
  #[error("Invalid value provided for option ID {0}")]
  InvalidOptionValue(i32),
  #[error("Invalid argument provided: {0}")]
  InvalidArgument(String),

  // --- I/O Errors ---
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),
}

impl LifecycleError {
  /// Maps an OS error raised while allocating backend resources.
  /// Descriptor, memory and thread exhaustion become `ResourceExhausted`.
  pub fn from_io(e: io::Error, what: &str) -> Self {
    if e.kind() == io::ErrorKind::OutOfMemory {
      return LifecycleError::ResourceExhausted(format!("{}: {}", what, e));
    }
    match e.raw_os_error() {
      Some(libc::EMFILE) | Some(libc::ENFILE) | Some(libc::ENOMEM) | Some(libc::EAGAIN) => {
        LifecycleError::ResourceExhausted(format!("{}: {}", what, e))
      }
      _ => LifecycleError::Io(e),
    }
  }

  /// `false` only for conditions that are informational, such as a redundant close.
  pub fn is_fatal(&self) -> bool {
    !matches!(self, LifecycleError::AlreadyClosed)
  }
}
