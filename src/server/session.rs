//! Per-connection session handling for the chat server.
//!
//! Each accepted connection runs one [`Session`]: a short handshake that
//! claims a display name, an active loop relaying chat lines, and a cleanup
//! path that always runs exactly once.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::{Dispatcher, Message, RegisterError, Registry};

/// Command a client sends to leave gracefully (case-insensitive).
pub const EXIT_COMMAND: &str = "/exit";

/// A session for one connected client.
pub struct Session {
    /// Unique session identifier, used in log output.
    id: Uuid,
    /// Remote peer address.
    peer_addr: SocketAddr,
    /// Shared connection registry.
    registry: Arc<Registry>,
    /// Broadcast dispatcher over the same registry.
    dispatcher: Dispatcher,
}

impl Session {
    /// Create a new session for an accepted connection.
    pub fn new(peer_addr: SocketAddr, registry: Arc<Registry>, dispatcher: Dispatcher) -> Self {
        let id = Uuid::new_v4();
        debug!("Created new session {} for {}", id, peer_addr);

        Self {
            id,
            peer_addr,
            registry,
            dispatcher,
        }
    }

    /// Get the session ID.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the peer address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Drive the session to completion: handshake, message loop, cleanup.
    ///
    /// All failures are contained here; nothing propagates to the acceptor.
    pub async fn run(self, stream: TcpStream) {
        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half).lines();

        // Handshake: the first line is the proposed display name.
        let proposed = match reader.next_line().await {
            Ok(Some(line)) => line.trim_end_matches('\r').to_string(),
            Ok(None) | Err(_) => String::new(),
        };

        let (sink, outbox) = mpsc::unbounded_channel::<String>();
        let name = match self.registry.register(&proposed, sink).await {
            Ok(()) => proposed,
            Err(e) => {
                debug!("Session {} handshake rejected: {}", self.id, e);
                reject(write_half, &e).await;
                return;
            }
        };

        info!(
            "Session {} registered '{}' from {}",
            self.id, name, self.peer_addr
        );

        // Writer task: drains queued lines to the socket. It ends when the
        // registry entry (the only sender) is dropped.
        let writer_task = tokio::spawn(drain_outbox(outbox, write_half));

        self.dispatcher
            .broadcast_system(format!("{name} joined the chat."))
            .await;
        self.dispatcher.broadcast_membership().await;

        // Active: relay chat lines until exit, EOF, or read error.
        loop {
            match reader.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim_end_matches('\r');
                    if line.eq_ignore_ascii_case(EXIT_COMMAND) {
                        debug!("Session {} requested exit", self.id);
                        break;
                    }
                    self.dispatcher.broadcast_chat(&name, line).await;
                }
                Ok(None) => {
                    debug!("Session {} connection closed by peer", self.id);
                    break;
                }
                Err(e) => {
                    debug!("Session {} read error: {}", self.id, e);
                    break;
                }
            }
        }

        // Terminating: every exit path out of the active loop lands here,
        // once. Deregistering drops the sink, which lets the writer task
        // drain and close the connection.
        self.registry.deregister(&name).await;
        self.dispatcher
            .broadcast_system(format!("{name} left the chat."))
            .await;
        self.dispatcher.broadcast_membership().await;

        if let Err(e) = writer_task.await {
            warn!("Session {} writer task failed: {}", self.id, e);
        }

        info!("Session {} ('{}') disconnected", self.id, name);
    }
}

/// Send a handshake rejection notice and close the connection.
///
/// A rejected session was never registered, so no join or leave broadcast
/// is ever emitted for it. The peer may already be gone; write errors are
/// ignored.
async fn reject(mut write_half: OwnedWriteHalf, error: &RegisterError) {
    let notice = match error {
        RegisterError::EmptyName => "Name is required. Disconnecting.".to_string(),
        RegisterError::NameTaken(name) => {
            format!("Name '{name}' is already in use. Disconnecting.")
        }
    };
    let line = format!("{}\n", Message::system(notice).to_line());
    let _ = write_half.write_all(line.as_bytes()).await;
    let _ = write_half.shutdown().await;
}

/// Forward queued outbound lines to the socket until the channel closes or
/// the peer stops accepting writes.
async fn drain_outbox(mut outbox: mpsc::UnboundedReceiver<String>, mut write_half: OwnedWriteHalf) {
    while let Some(line) = outbox.recv().await {
        let framed = format!("{line}\n");
        if write_half.write_all(framed.as_bytes()).await.is_err() {
            // Peer is gone; the read side of the session will observe the
            // closed socket and run cleanup.
            break;
        }
    }
    let _ = write_half.shutdown().await;
}
