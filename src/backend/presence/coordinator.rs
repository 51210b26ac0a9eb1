//! Coordinator
//!
//! The command processing state machine. Each inbound command is one
//! atomic step against the combined registry + lock table state: the
//! in-memory mutation completes synchronously inside its serialization
//! point, and only the boundary calls (auth verification, collaborator
//! resolution) involve external I/O.
//!
//! Replies go to the originating connection; broadcasts go to the note's
//! collaborators minus the acting identity. A disconnect during in-flight
//! processing still finishes the mutation; the unreachable reply is
//! simply dropped by the gateway.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::backend::auth::service::{AuthIdentity, AuthService};
use crate::backend::error::CoordinatorError;
use crate::backend::notes::resolver::CollaboratorResolver;
use crate::backend::notes::store::NoteStore;
use crate::backend::presence::locks::{NoteLockTable, ReleaseOutcome};
use crate::backend::presence::registry::{ConnectionHandle, SessionRegistry};
use crate::shared::command::{Command, NoteId, UserIdentity};
use crate::shared::notify::Outbound;

/// Orchestrates session registry, lock table, resolver, and auth service.
#[derive(Clone)]
pub struct Coordinator {
    registry: SessionRegistry,
    locks: NoteLockTable,
    resolver: CollaboratorResolver,
    auth: Arc<dyn AuthService>,
    release_locks_on_disconnect: bool,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn NoteStore>,
        auth: Arc<dyn AuthService>,
        release_locks_on_disconnect: bool,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            locks: NoteLockTable::new(),
            resolver: CollaboratorResolver::new(store),
            auth,
            release_locks_on_disconnect,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn locks(&self) -> &NoteLockTable {
        &self.locks
    }

    /// Process one decoded command for a connection.
    ///
    /// On success `session` may be updated (authenticate); errors become
    /// `error` envelopes addressed to the caller only.
    pub async fn handle(
        &self,
        conn: &ConnectionHandle,
        session: &mut Option<AuthIdentity>,
        command: Command,
    ) -> Outbound {
        let result = match command {
            Command::Authenticate { token } => self.authenticate(conn, session, &token).await,
            Command::AcquireLock { note_id } => match session.as_ref() {
                Some(auth) => self.acquire_lock(auth, note_id).await,
                None => Err(CoordinatorError::NotAuthenticated),
            },
            Command::ReleaseLock { note_id } => match session.as_ref() {
                Some(auth) => self.release_lock(auth, note_id).await,
                None => Err(CoordinatorError::NotAuthenticated),
            },
            Command::LockStatus { note_id } => match session.as_ref() {
                Some(_) => Ok(self.lock_status(note_id).await),
                None => Err(CoordinatorError::NotAuthenticated),
            },
            Command::CollaboratorAdded { note_id, email } => match session.as_ref() {
                Some(auth) => self.collaborator_added(auth, note_id, email).await,
                None => Err(CoordinatorError::NotAuthenticated),
            },
        };

        match result {
            Ok(reply) => reply,
            Err(error) => {
                tracing::debug!(conn_id = %conn.conn_id(), error = %error, "command failed");
                error.to_outbound()
            }
        }
    }

    /// Verify the credential proof and bind identity → connection.
    ///
    /// The identity of a connection is immutable once established; a
    /// second authenticate on the same connection is rejected without
    /// touching any state.
    async fn authenticate(
        &self,
        conn: &ConnectionHandle,
        session: &mut Option<AuthIdentity>,
        token: &str,
    ) -> Result<Outbound, CoordinatorError> {
        if session.is_some() {
            return Err(CoordinatorError::Auth(
                "connection is already authenticated".to_string(),
            ));
        }

        let verified = self.auth.verify(token).await?;

        self.registry
            .bind(verified.identity.clone(), conn.clone())
            .await;
        tracing::info!(
            identity = %verified.identity,
            conn_id = %conn.conn_id(),
            "session authenticated"
        );

        let reply = Outbound::authenticated(verified.identity.as_str());
        *session = Some(verified);
        Ok(reply)
    }

    /// First-come-first-served acquisition; the CAS and the broadcast
    /// decision sit under one serialization point per note.
    async fn acquire_lock(
        &self,
        session: &AuthIdentity,
        note_id: NoteId,
    ) -> Result<Outbound, CoordinatorError> {
        let status = match self
            .locks
            .try_acquire(note_id, &session.identity, &session.display_name)
            .await
        {
            Ok(status) => status,
            Err((holder, status)) => {
                return Err(CoordinatorError::LockConflict {
                    note_id,
                    holder,
                    status,
                });
            }
        };

        tracing::info!(identity = %session.identity, note_id, "lock acquired");

        // Lock is ours either way; a resolver failure only degrades the
        // broadcast, it never rolls the acquisition back.
        match self.resolver.resolve(note_id).await {
            Ok(collaborators) => {
                let message =
                    Outbound::note_locked(note_id, status, session.identity.as_str());
                self.broadcast(collaborators, &session.identity, message).await;
                Ok(Outbound::lock_acquired(note_id))
            }
            Err(error) => {
                tracing::warn!(
                    note_id,
                    error = %error,
                    "collaborator lookup failed, lock broadcast skipped"
                );
                Ok(Outbound::lock_acquired_unnotified(note_id))
            }
        }
    }

    /// Release by the holder frees the note and notifies collaborators;
    /// releasing an already-free note is a silent no-op.
    async fn release_lock(
        &self,
        session: &AuthIdentity,
        note_id: NoteId,
    ) -> Result<Outbound, CoordinatorError> {
        match self.locks.release(note_id, &session.identity).await {
            ReleaseOutcome::Released => {
                tracing::info!(identity = %session.identity, note_id, "lock released");
                // Release stands regardless; a resolver failure only
                // degrades the broadcast, and the caller is told so.
                match self.resolver.resolve(note_id).await {
                    Ok(collaborators) => {
                        self.broadcast(
                            collaborators,
                            &session.identity,
                            Outbound::note_unlocked(note_id),
                        )
                        .await;
                        Ok(Outbound::lock_released(note_id))
                    }
                    Err(error) => {
                        tracing::warn!(
                            note_id,
                            error = %error,
                            "collaborator lookup failed, release broadcast skipped"
                        );
                        Ok(Outbound::lock_released_unnotified(note_id))
                    }
                }
            }
            ReleaseOutcome::NotHeld => Ok(Outbound::lock_released(note_id)),
            ReleaseOutcome::HeldByOther { .. } => {
                Err(CoordinatorError::LockHeldByOther { note_id })
            }
        }
    }

    /// Current lock state, reported to the caller only.
    async fn lock_status(&self, note_id: NoteId) -> Outbound {
        use crate::backend::presence::locks::LockState;
        match self.locks.get(note_id).await {
            LockState::Free => Outbound::status_free(note_id),
            LockState::Held { status, .. } => Outbound::status_held(note_id, &status),
        }
    }

    /// Informational push to a freshly added collaborator, if online.
    async fn collaborator_added(
        &self,
        session: &AuthIdentity,
        note_id: NoteId,
        email: String,
    ) -> Result<Outbound, CoordinatorError> {
        let target = UserIdentity::new(email);

        let title = self
            .resolver
            .note_title(note_id)
            .await?
            .unwrap_or_else(|| format!("note {}", note_id));

        let push = Outbound::collaborator_added(
            note_id,
            format!(
                "{} added you as a collaborator on \"{}\"",
                session.display_name, title
            ),
        );

        if self.registry.send_to(&target, push).await {
            Ok(Outbound::collaborator_added(
                note_id,
                format!("{} was notified", target),
            ))
        } else {
            Ok(Outbound::collaborator_added(
                note_id,
                format!("{} is offline", target),
            ))
        }
    }

    /// Synthetic event raised by the gateway when a transport closes.
    ///
    /// Unbinds the identity only if the registry entry still refers to
    /// this connection. Locks are left in place unless the
    /// release-on-disconnect policy is enabled, and even then only when
    /// this connection was the identity's current one.
    pub async fn disconnect(&self, session: Option<&AuthIdentity>, conn_id: Uuid) {
        let Some(auth) = session else {
            tracing::debug!(%conn_id, "unauthenticated connection closed");
            return;
        };

        let removed = self.registry.unbind(&auth.identity, conn_id).await;
        tracing::info!(
            identity = %auth.identity,
            %conn_id,
            removed,
            "session disconnected"
        );

        if removed && self.release_locks_on_disconnect {
            let released = self.locks.release_all_held_by(&auth.identity).await;
            for note_id in released {
                tracing::info!(identity = %auth.identity, note_id, "lock released on disconnect");
                match self.resolver.resolve(note_id).await {
                    Ok(collaborators) => {
                        self.broadcast(
                            collaborators,
                            &auth.identity,
                            Outbound::note_unlocked(note_id),
                        )
                        .await;
                    }
                    Err(error) => {
                        tracing::warn!(note_id, error = %error, "release broadcast skipped");
                    }
                }
            }
        }
    }

    /// Fan out one message to every recipient except the acting identity.
    ///
    /// Delivery is best-effort per recipient; per-recipient order is
    /// preserved by each connection's own channel.
    async fn broadcast(
        &self,
        recipients: HashSet<UserIdentity>,
        exclude: &UserIdentity,
        message: Outbound,
    ) {
        for identity in recipients {
            if &identity == exclude {
                continue;
            }
            self.registry.send_to(&identity, message.clone()).await;
        }
    }
}
