// src/options.rs

use std::time::Duration;

use crate::error::LifecycleError;

// Use values consistent with libzmq's zmq_ctx_set / zmq_ctx_get where possible
pub const IO_THREADS: i32 = 1;
pub const MAX_SOCKETS: i32 = 2;
pub const SOCKET_LIMIT: i32 = 3;
pub const IPV6: i32 = 42;
pub const BLOCKY: i32 = 70;

pub const DEFAULT_IO_THREADS: usize = 1;
pub const DEFAULT_MAX_SOCKETS: usize = 1023;
pub const DEFAULT_SOCKET_LIMIT: usize = 65535;
/// Upper bound for `io_threads`. Each I/O thread is a real OS thread started
/// when the context opens.
pub const MAX_IO_THREADS: usize = 1024;
pub const DEFAULT_LINGER: Duration = Duration::from_secs(1);

/// What `close_context` does when the context still owns open sockets.
/// A manager applies one policy to every context it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TeardownPolicy {
  /// Fail with `SocketsStillOpen`; nothing is released.
  #[default]
  Reject,
  /// Close the remaining sockets (logging each one), then destroy the context.
  ForceClose,
}

/// Options a context is opened with.
#[derive(Debug, Clone)]
pub struct ContextOptions {
  /// Number of runtime I/O threads. Fixed once the context is open.
  pub io_threads: usize,
  /// Maximum number of sockets open at once on the context.
  pub max_sockets: usize,
  /// Upper bound for `max_sockets`. Read-only through `get_option`.
  pub socket_limit: usize,
  /// Recorded for transports; the lifecycle core does not interpret it.
  pub ipv6: bool,
  /// When true, destroying the context waits up to `linger` for runtime tasks to finish.
  pub blocky: bool,
  pub linger: Duration,
  /// Prefix for I/O thread names (`<prefix>-io-<n>`).
  pub thread_name_prefix: String,
}

impl Default for ContextOptions {
  fn default() -> Self {
    Self {
      io_threads: DEFAULT_IO_THREADS,
      max_sockets: DEFAULT_MAX_SOCKETS,
      socket_limit: DEFAULT_SOCKET_LIMIT,
      ipv6: false,
      blocky: true,
      linger: DEFAULT_LINGER,
      thread_name_prefix: "rzmq".to_string(),
    }
  }
}

impl ContextOptions {
  /// Checks the options before a context is opened with them.
  pub fn validate(&self) -> Result<(), LifecycleError> {
    if self.io_threads > MAX_IO_THREADS {
      return Err(LifecycleError::InvalidOptionValue(IO_THREADS));
    }
    if self.max_sockets == 0 || self.max_sockets > self.socket_limit {
      return Err(LifecycleError::InvalidOptionValue(MAX_SOCKETS));
    }
    if self.thread_name_prefix.is_empty() {
      return Err(LifecycleError::InvalidArgument("thread name prefix must not be empty".into()));
    }
    Ok(())
  }

  /// Reads a numeric option, mirroring `zmq_ctx_get`.
  pub fn get(&self, option: i32) -> Result<i32, LifecycleError> {
    let value = match option {
      IO_THREADS => self.io_threads,
      MAX_SOCKETS => self.max_sockets,
      SOCKET_LIMIT => self.socket_limit,
      IPV6 => self.ipv6 as usize,
      BLOCKY => self.blocky as usize,
      _ => return Err(LifecycleError::InvalidOption(option)),
    };
    i32::try_from(value).map_err(|_| LifecycleError::InvalidOptionValue(option))
  }

  /// Applies a numeric option to options that have not been used to open a context yet.
  pub fn set(&mut self, option: i32, value: i32) -> Result<(), LifecycleError> {
    match option {
      IO_THREADS => {
        let threads = parse_count(option, value)?;
        if threads > MAX_IO_THREADS {
          return Err(LifecycleError::InvalidOptionValue(option));
        }
        self.io_threads = threads;
      }
      MAX_SOCKETS => {
        let max = parse_count(option, value)?;
        if max == 0 || max > self.socket_limit {
          return Err(LifecycleError::InvalidOptionValue(option));
        }
        self.max_sockets = max;
      }
      SOCKET_LIMIT => return Err(LifecycleError::InvalidArgument("SOCKET_LIMIT is read-only".into())),
      IPV6 => self.ipv6 = parse_flag(option, value)?,
      BLOCKY => self.blocky = parse_flag(option, value)?,
      _ => return Err(LifecycleError::InvalidOption(option)),
    }
    Ok(())
  }
}

fn parse_count(option: i32, value: i32) -> Result<usize, LifecycleError> {
  usize::try_from(value).map_err(|_| LifecycleError::InvalidOptionValue(option))
}

fn parse_flag(option: i32, value: i32) -> Result<bool, LifecycleError> {
  match value {
    0 => Ok(false),
    1 => Ok(true),
    _ => Err(LifecycleError::InvalidOptionValue(option)),
  }
}

// --- Helper functions for parsing option values ---
/// Parses a byte slice representing an integer option.
/// Native endianness, as with the ZMQ C API.
pub(crate) fn parse_i32_option(option: i32, value: &[u8]) -> Result<i32, LifecycleError> {
  let arr: [u8; 4] = value
    .try_into()
    .map_err(|_| LifecycleError::InvalidOptionValue(option))?;
  Ok(i32::from_ne_bytes(arr))
}
