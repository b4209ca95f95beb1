//! Chat module for PARLOR.
//!
//! This module provides the chat core:
//! - Connection registry mapping display names to outbound sinks
//! - Broadcast dispatcher for chat, system, and membership messages
//! - Wire message model (line formats)

mod dispatcher;
mod message;
mod registry;

pub use dispatcher::Dispatcher;
pub use message::{Message, SYSTEM_PREFIX, USER_LIST_PREFIX};
pub use registry::{RegisterError, Registry, Sink};
