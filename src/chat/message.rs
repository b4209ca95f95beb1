//! Wire message model for PARLOR.
//!
//! Every server-to-client message is a single newline-terminated line.
//! Three line shapes exist, distinguished by prefix:
//!
//! - `/users:alice,bob` - membership snapshot
//! - `**alice**: hi` - chat message, sender delimited for client rendering
//! - `[System] bob joined the chat.` - system notice

/// Prefix for membership snapshot lines.
pub const USER_LIST_PREFIX: &str = "/users:";

/// Prefix for system notice lines.
pub const SYSTEM_PREFIX: &str = "[System] ";

/// A message to be delivered to connected clients.
///
/// Messages are transient; they exist only for the duration of a broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Chat message from a named participant.
    Chat { sender: String, body: String },
    /// System notice (join/leave, handshake rejection).
    System(String),
    /// Membership snapshot listing the current display names.
    Membership(Vec<String>),
}

impl Message {
    /// Create a chat message.
    pub fn chat(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Chat {
            sender: sender.into(),
            body: body.into(),
        }
    }

    /// Create a system notice.
    pub fn system(text: impl Into<String>) -> Self {
        Self::System(text.into())
    }

    /// Create a membership snapshot.
    pub fn membership(names: Vec<String>) -> Self {
        Self::Membership(names)
    }

    /// Format the message as a wire line (without the trailing newline).
    pub fn to_line(&self) -> String {
        match self {
            Message::Chat { sender, body } => format!("**{sender}**: {body}"),
            Message::System(text) => format!("{SYSTEM_PREFIX}{text}"),
            Message::Membership(names) => {
                format!("{USER_LIST_PREFIX}{}", names.join(","))
            }
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_line())
    }
}
