// src/lifecycle.rs

//! The `Created -> Open -> Closed` state machine shared by contexts and sockets.

use crate::error::LifecycleError;
use std::fmt;

/// Lifecycle state of a context or socket handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleState {
  /// Allocated by the manager, backend resources not yet acquired.
  Created,
  /// Backend resources acquired; the handle is usable.
  Open,
  /// Terminal. Backend resources released; the handle is never reused.
  Closed,
}

impl fmt::Display for HandleState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HandleState::Created => write!(f, "created"),
      HandleState::Open => write!(f, "open"),
      HandleState::Closed => write!(f, "closed"),
    }
  }
}

/// Holds a `HandleState` and only permits legal transitions.
/// Callers provide their own locking around the cell.
#[derive(Debug)]
pub(crate) struct StateCell {
  state: HandleState,
}

impl StateCell {
  pub(crate) fn new() -> Self {
    Self {
      state: HandleState::Created,
    }
  }

  pub(crate) fn get(&self) -> HandleState {
    self.state
  }

  pub(crate) fn is_open(&self) -> bool {
    self.state == HandleState::Open
  }

  /// `Created -> Open`.
  pub(crate) fn open(&mut self) -> Result<(), LifecycleError> {
    match self.state {
      HandleState::Created => {
        self.state = HandleState::Open;
        Ok(())
      }
      HandleState::Open => Err(LifecycleError::InvalidState("handle is already open")),
      HandleState::Closed => Err(LifecycleError::InvalidState("handle is closed and cannot be reopened")),
    }
  }

  /// `Open -> Closed`. A second close is reported as `AlreadyClosed` and changes nothing.
  pub(crate) fn close(&mut self) -> Result<(), LifecycleError> {
    match self.state {
      HandleState::Open => {
        self.state = HandleState::Closed;
        Ok(())
      }
      HandleState::Closed => Err(LifecycleError::AlreadyClosed),
      HandleState::Created => Err(LifecycleError::InvalidState("handle was never opened")),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn open_then_close() {
    let mut cell = StateCell::new();
    assert_eq!(cell.get(), HandleState::Created);
    cell.open().unwrap();
    assert!(cell.is_open());
    cell.close().unwrap();
    assert_eq!(cell.get(), HandleState::Closed);
  }

  #[test]
  fn close_before_open_is_invalid_state() {
    let mut cell = StateCell::new();
    assert!(matches!(cell.close(), Err(LifecycleError::InvalidState(_))));
    assert_eq!(cell.get(), HandleState::Created);
  }

  #[test]
  fn double_open_is_invalid_state() {
    let mut cell = StateCell::new();
    cell.open().unwrap();
    assert!(matches!(cell.open(), Err(LifecycleError::InvalidState(_))));
    assert!(cell.is_open());
  }

  #[test]
  fn closed_is_terminal() {
    let mut cell = StateCell::new();
    cell.open().unwrap();
    cell.close().unwrap();
    assert!(matches!(cell.close(), Err(LifecycleError::AlreadyClosed)));
    assert!(matches!(cell.open(), Err(LifecycleError::InvalidState(_))));
    assert_eq!(cell.get(), HandleState::Closed);
  }
}
