//! Chat server module.
//!
//! This module provides the TCP listener and per-connection session
//! handling for the chat server.

mod listener;
mod session;

pub use listener::{ChatServer, ConnectionPermit};
pub use session::{Session, EXIT_COMMAND};
