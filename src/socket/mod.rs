// src/socket/mod.rs

pub(crate) mod core;
pub mod types;

pub use types::{IntoSocketType, Socket, SocketType};
