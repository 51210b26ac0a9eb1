//! Session Registry
//!
//! Maps a user identity to at most one live connection. A connection is
//! represented by the sending half of its outbound channel; the socket
//! itself stays owned by its gateway task.
//!
//! A new authenticated connection for an already-registered identity
//! replaces the old entry. The old socket is not closed by this event; it
//! simply becomes unreachable for notifications.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::shared::command::UserIdentity;
use crate::shared::notify::Outbound;

/// A reference to one live connection.
///
/// Cloning is cheap; all clones send into the same socket task.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    conn_id: Uuid,
    connected_at: DateTime<Utc>,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            connected_at: Utc::now(),
            sender,
        }
    }

    pub fn conn_id(&self) -> Uuid {
        self.conn_id
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Best-effort write. A send to a connection whose task has exited is
    /// silently dropped; the peer is gone and nothing here may block on it.
    pub fn send(&self, message: Outbound) {
        if self.sender.send(message).is_err() {
            tracing::debug!(conn_id = %self.conn_id, "dropping message for closed connection");
        }
    }
}

/// Identity → connection mapping for all authenticated sessions.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<UserIdentity, ConnectionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an identity to a connection, replacing any prior entry.
    pub async fn bind(&self, identity: UserIdentity, handle: ConnectionHandle) {
        let mut sessions = self.sessions.write().await;
        if let Some(previous) = sessions.insert(identity.clone(), handle) {
            tracing::info!(
                identity = %identity,
                old_conn = %previous.conn_id(),
                "replaced existing session binding"
            );
        }
    }

    /// Look up the live connection for an identity.
    pub async fn lookup(&self, identity: &UserIdentity) -> Option<ConnectionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(identity).cloned()
    }

    /// Remove the entry for `identity`, but only if it still refers to
    /// `conn_id`. Guards against a stale disconnect racing a newer
    /// authenticate for the same identity.
    pub async fn unbind(&self, identity: &UserIdentity, conn_id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(identity) {
            Some(handle) if handle.conn_id() == conn_id => {
                sessions.remove(identity);
                true
            }
            _ => false,
        }
    }

    /// Whether an identity currently has a live session.
    pub async fn is_online(&self, identity: &UserIdentity) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(identity)
    }

    /// Send a message to an identity's current connection, if any.
    /// Returns false when the identity has no live session.
    pub async fn send_to(&self, identity: &UserIdentity, message: Outbound) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(identity) {
            Some(handle) => {
                handle.send(message);
                true
            }
            None => false,
        }
    }

    /// Number of live sessions, for logging.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}
