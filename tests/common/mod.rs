//! Test helpers for chat server integration tests.
//!
//! Provides TestClient and a helper that spawns a full server on an
//! ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use parlor::chat::{Dispatcher, Registry};
use parlor::config::ServerConfig;
use parlor::server::{ChatServer, Session};

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Spawn a chat server on an ephemeral port.
///
/// Returns the bound address and the shared registry for assertions.
pub async fn spawn_server() -> (SocketAddr, Arc<Registry>) {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_connections: 16,
    };
    let server = ChatServer::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();

    let registry = Arc::new(Registry::new());
    let dispatcher = Dispatcher::new(Arc::clone(&registry));

    let session_registry = Arc::clone(&registry);
    tokio::spawn(server.run(move |stream, peer_addr| {
        let session = Session::new(peer_addr, Arc::clone(&session_registry), dispatcher.clone());
        session.run(stream)
    }));

    (addr, registry)
}

/// Test client for connecting to the chat server.
pub struct TestClient {
    reader: BufReader<TcpStream>,
}

impl TestClient {
    /// Connect to the server at the given address.
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = timeout(DEFAULT_TIMEOUT, TcpStream::connect(addr))
            .await
            .expect("connect timed out")
            .expect("connect failed");
        Self {
            reader: BufReader::new(stream),
        }
    }

    /// Connect and complete the handshake under `name`, consuming the join
    /// notice and membership update the server sends back.
    pub async fn join(addr: SocketAddr, name: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client.send_line(name).await;
        client.expect_line(&format!("[System] {name} joined the chat.")).await;
        client.recv_line().await; // membership snapshot
        client
    }

    /// Send one newline-terminated line to the server.
    pub async fn send_line(&mut self, line: &str) {
        self.reader
            .get_mut()
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write failed");
    }

    /// Receive one line from the server (without the line terminator).
    pub async fn recv_line(&mut self) -> String {
        let mut line = String::new();
        let n = timeout(DEFAULT_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("read timed out")
            .expect("read failed");
        assert!(n > 0, "connection closed while expecting a line");
        line.trim_end_matches(['\r', '\n']).to_string()
    }

    /// Receive one line and assert its exact content.
    pub async fn expect_line(&mut self, expected: &str) {
        let line = self.recv_line().await;
        assert_eq!(line, expected);
    }

    /// Receive lines until a membership snapshot arrives; return its names.
    pub async fn recv_membership(&mut self) -> Vec<String> {
        loop {
            let line = self.recv_line().await;
            if let Some(list) = line.strip_prefix("/users:") {
                if list.is_empty() {
                    return Vec::new();
                }
                return list.split(',').map(str::to_string).collect();
            }
        }
    }

    /// Read until the server closes the connection, returning the lines
    /// received on the way out.
    pub async fn recv_until_close(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            let n = timeout(DEFAULT_TIMEOUT, self.reader.read_line(&mut line))
                .await
                .expect("read timed out")
                .expect("read failed");
            if n == 0 {
                return lines;
            }
            lines.push(line.trim_end_matches(['\r', '\n']).to_string());
        }
    }
}
