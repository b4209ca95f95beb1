//! Connection registry for PARLOR.
//!
//! The registry is the single piece of shared mutable state in the server:
//! a mapping from display name to the outbound sink of the session that
//! holds it. It is shared across all sessions and provides thread-safe
//! registration, removal, and iteration.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::{mpsc, RwLock};

/// Outbound sink for one connection.
///
/// Each session owns a writer task that drains the receiving end to its
/// socket, so sending a line here never blocks the caller.
pub type Sink = mpsc::UnboundedSender<String>;

/// Error returned when a registration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// The proposed name was empty or whitespace-only.
    #[error("name is required")]
    EmptyName,
    /// The proposed name is already held by a live session.
    #[error("name '{0}' is already in use")]
    NameTaken(String),
}

/// Registry of connected participants.
///
/// Invariant: a name is present exactly while a live session holds it, and
/// no two live sessions ever hold the same name.
pub struct Registry {
    /// Sinks indexed by display name.
    participants: RwLock<HashMap<String, Sink>>,
}

impl Registry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            participants: RwLock::new(HashMap::new()),
        }
    }

    /// Register a participant under `name`.
    ///
    /// The check and the insert happen under one write lock, so two
    /// sessions racing for the same name cannot both succeed. A rejected
    /// registration leaves the existing entry untouched.
    pub async fn register(&self, name: &str, sink: Sink) -> Result<(), RegisterError> {
        if name.trim().is_empty() {
            return Err(RegisterError::EmptyName);
        }

        let mut participants = self.participants.write().await;
        if participants.contains_key(name) {
            return Err(RegisterError::NameTaken(name.to_string()));
        }
        participants.insert(name.to_string(), sink);
        Ok(())
    }

    /// Remove the participant registered under `name`.
    ///
    /// Returns true if an entry was removed. Removing an absent name is a
    /// no-op, so the call is idempotent.
    pub async fn deregister(&self, name: &str) -> bool {
        self.participants.write().await.remove(name).is_some()
    }

    /// Take a point-in-time snapshot of the current display names.
    pub async fn snapshot(&self) -> Vec<String> {
        self.participants.read().await.keys().cloned().collect()
    }

    /// Check if a name is currently registered.
    pub async fn is_registered(&self, name: &str) -> bool {
        self.participants.read().await.contains_key(name)
    }

    /// Get the number of registered participants.
    pub async fn participant_count(&self) -> usize {
        self.participants.read().await.len()
    }

    /// Apply `f` to every currently-registered `(name, sink)` pair.
    ///
    /// The read lock is held only for the duration of the iteration; sends
    /// on a [`Sink`] do not block, so the lock is never held across I/O.
    /// Sessions registered or removed mid-broadcast may or may not be
    /// visited (best-effort delivery).
    pub async fn for_each_sink<F>(&self, mut f: F)
    where
        F: FnMut(&str, &Sink),
    {
        let participants = self.participants.read().await;
        for (name, sink) in participants.iter() {
            f(name, sink);
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
