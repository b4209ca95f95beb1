//! Broadcast dispatcher for PARLOR.
//!
//! Formats chat messages, system notices, and membership snapshots as wire
//! lines and fans them out to every sink in the registry.

use std::sync::Arc;

use tracing::{debug, warn};

use super::message::Message;
use super::registry::Registry;

/// Fans out messages to every registered participant.
///
/// Cheap to clone; every session carries its own handle to the shared
/// registry.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    /// Create a dispatcher over the given registry.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Broadcast a chat message from `sender` to every participant.
    pub async fn broadcast_chat(&self, sender: &str, body: &str) {
        self.fan_out(Message::chat(sender, body)).await;
    }

    /// Broadcast a system notice to every participant.
    pub async fn broadcast_system(&self, text: impl Into<String>) {
        self.fan_out(Message::system(text)).await;
    }

    /// Broadcast the current membership snapshot to every participant.
    ///
    /// Called after every registration and deregistration so all clients
    /// converge on the same view. No ordering guarantee is made relative
    /// to concurrent chat broadcasts.
    pub async fn broadcast_membership(&self) {
        let names = self.registry.snapshot().await;
        self.fan_out(Message::membership(names)).await;
    }

    /// Send a formatted line to every sink, isolating per-sink failures.
    async fn fan_out(&self, message: Message) {
        let line = message.to_line();
        debug!("broadcast: {line}");

        self.registry
            .for_each_sink(|name, sink| {
                if sink.send(line.clone()).is_err() {
                    // The session's writer task is gone; its own cleanup
                    // path will remove the registry entry.
                    warn!("dropping message for '{name}': sink closed");
                }
            })
            .await;
    }
}
