//! PARLOR - Minimal multi-user chat server
//!
//! A line-oriented TCP chat room with live membership updates, implemented
//! in Rust.

pub mod chat;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;

pub use chat::{Dispatcher, Message, RegisterError, Registry, Sink, SYSTEM_PREFIX, USER_LIST_PREFIX};
pub use config::Config;
pub use error::{ParlorError, Result};
pub use server::{ChatServer, ConnectionPermit, Session, EXIT_COMMAND};
