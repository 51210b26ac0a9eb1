//! End-to-end coordinator flows over the library API.
//!
//! Each test drives the coordinator the way the WebSocket gateway does:
//! decoded commands in, envelope replies back, broadcasts observed on the
//! per-connection channels.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{timeout, Duration};

use notecollab::backend::auth::{create_token, AuthIdentity, JwtAuthService};
use notecollab::backend::error::NoteStoreError;
use notecollab::backend::notes::{InMemoryNoteStore, NoteStore};
use notecollab::backend::presence::{ConnectionHandle, Coordinator, LockState};
use notecollab::shared::{Command, NoteId, Outbound, UserIdentity};

/// One simulated client: the connection handle the gateway would own, the
/// receiving end of its outbound channel, and its session slot.
struct Client {
    handle: ConnectionHandle,
    rx: UnboundedReceiver<Outbound>,
    session: Option<AuthIdentity>,
}

impl Client {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            handle: ConnectionHandle::new(tx),
            rx,
            session: None,
        }
    }

    async fn send(&mut self, coordinator: &Coordinator, command: Command) -> Outbound {
        coordinator.handle(&self.handle, &mut self.session, command).await
    }

    /// Next pushed message, failing the test if none arrives promptly.
    async fn next_push(&mut self) -> Outbound {
        timeout(Duration::from_secs(1), self.rx.recv())
            .await
            .expect("timed out waiting for a push")
            .expect("outbound channel closed")
    }

    fn no_push(&mut self) {
        assert!(self.rx.try_recv().is_err(), "unexpected push was delivered");
    }
}

fn coordinator(store: InMemoryNoteStore) -> Coordinator {
    Coordinator::new(Arc::new(store), Arc::new(JwtAuthService::new()), false)
}

async fn connect(coordinator: &Coordinator, email: &str, name: &str) -> Client {
    let mut client = Client::new();
    let token = create_token(email, Some(name)).expect("token creation");
    let reply = client
        .send(coordinator, Command::Authenticate { token })
        .await;
    assert!(
        matches!(reply, Outbound::Authenticated { .. }),
        "authentication failed: {:?}",
        reply
    );
    client
}

/// Store whose note 42 has Ada, Grace, and Joan as collaborators.
async fn shared_note_store() -> InMemoryNoteStore {
    let store = InMemoryNoteStore::new();
    store.add_note(42, "Quarterly plan").await;
    store.add_collaborator(42, "ada@example.com").await;
    store.add_collaborator(42, "grace@example.com").await;
    store.add_collaborator(42, "joan@example.com").await;
    store
}

#[tokio::test]
async fn test_acquire_broadcasts_to_other_collaborators_only() {
    let coordinator = coordinator(shared_note_store().await);
    let mut ada = connect(&coordinator, "ada@example.com", "Ada").await;
    let mut grace = connect(&coordinator, "grace@example.com", "Grace").await;
    let mut joan = connect(&coordinator, "joan@example.com", "Joan").await;

    let reply = ada.send(&coordinator, Command::AcquireLock { note_id: 42 }).await;
    assert!(matches!(reply, Outbound::LockAcquired { note_id: 42, .. }));

    for client in [&mut grace, &mut joan] {
        match client.next_push().await {
            Outbound::NoteLocked { message, note_id, holder } => {
                assert_eq!(note_id, 42);
                assert_eq!(holder, "ada@example.com");
                assert!(message.contains("Ada is editing this note"));
                assert!(message.contains("42"));
            }
            other => panic!("expected noteLocked, got {:?}", other),
        }
    }

    // The acquirer gets the direct reply, never the broadcast.
    ada.no_push();
}

#[tokio::test]
async fn test_conflicting_acquire_names_the_holder() {
    let coordinator = coordinator(shared_note_store().await);
    let mut ada = connect(&coordinator, "ada@example.com", "Ada").await;
    let mut grace = connect(&coordinator, "grace@example.com", "Grace").await;

    ada.send(&coordinator, Command::AcquireLock { note_id: 42 }).await;
    let reply = grace.send(&coordinator, Command::AcquireLock { note_id: 42 }).await;

    match reply {
        Outbound::Error { message, code } => {
            assert_eq!(code, "lock_conflict");
            assert!(message.contains("Ada"));
        }
        other => panic!("expected error, got {:?}", other),
    }

    // Loser's attempt must not have disturbed the winner's lock.
    match coordinator.locks().get(42).await {
        LockState::Held { holder, .. } => {
            assert_eq!(holder, UserIdentity::new("ada@example.com"));
        }
        LockState::Free => panic!("lock lost after failed acquire"),
    }
}

#[tokio::test]
async fn test_concurrent_acquires_produce_one_winner() {
    let coordinator = coordinator(shared_note_store().await);

    let mut tasks = Vec::new();
    for i in 0..8 {
        let coordinator = coordinator.clone();
        tasks.push(tokio::spawn(async move {
            let email = format!("user{}@example.com", i);
            let mut client = connect(&coordinator, &email, &format!("User {}", i)).await;
            let reply = client.send(&coordinator, Command::AcquireLock { note_id: 7 }).await;
            matches!(reply, Outbound::LockAcquired { .. })
        }));
    }

    let mut winners = 0;
    for task in tasks {
        if task.await.expect("acquire task panicked") {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    assert!(!coordinator.locks().get(7).await.is_free());
}

#[tokio::test]
async fn test_release_notifies_and_is_idempotent() {
    let coordinator = coordinator(shared_note_store().await);
    let mut ada = connect(&coordinator, "ada@example.com", "Ada").await;
    let mut grace = connect(&coordinator, "grace@example.com", "Grace").await;

    ada.send(&coordinator, Command::AcquireLock { note_id: 42 }).await;
    grace.next_push().await; // noteLocked

    let reply = ada.send(&coordinator, Command::ReleaseLock { note_id: 42 }).await;
    assert!(matches!(reply, Outbound::LockReleased { note_id: 42, .. }));
    assert!(matches!(grace.next_push().await, Outbound::NoteUnlocked { note_id: 42, .. }));

    // Releasing an already-free note acks again but broadcasts nothing.
    let reply = ada.send(&coordinator, Command::ReleaseLock { note_id: 42 }).await;
    assert!(matches!(reply, Outbound::LockReleased { .. }));
    grace.no_push();
}

#[tokio::test]
async fn test_release_by_non_holder_is_rejected() {
    let coordinator = coordinator(shared_note_store().await);
    let mut ada = connect(&coordinator, "ada@example.com", "Ada").await;
    let mut grace = connect(&coordinator, "grace@example.com", "Grace").await;

    ada.send(&coordinator, Command::AcquireLock { note_id: 42 }).await;

    let reply = grace.send(&coordinator, Command::ReleaseLock { note_id: 42 }).await;
    assert!(matches!(reply, Outbound::Error { code, .. } if code == "lock_held_by_other"));
    assert!(!coordinator.locks().get(42).await.is_free());
}

#[tokio::test]
async fn test_lock_status_reports_sentinel_states() {
    let coordinator = coordinator(shared_note_store().await);
    let mut ada = connect(&coordinator, "ada@example.com", "Ada").await;
    let mut grace = connect(&coordinator, "grace@example.com", "Grace").await;

    let reply = grace.send(&coordinator, Command::LockStatus { note_id: 42 }).await;
    assert!(matches!(reply, Outbound::LockStatus { message, .. } if message == "status:free"));

    ada.send(&coordinator, Command::AcquireLock { note_id: 42 }).await;
    let reply = grace.send(&coordinator, Command::LockStatus { note_id: 42 }).await;
    match reply {
        Outbound::LockStatus { message, note_id } => {
            assert_eq!(note_id, 42);
            assert_eq!(message, "status:Ada is editing this note");
        }
        other => panic!("expected lockStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn test_disconnect_keeps_locks_by_default() {
    let coordinator = coordinator(shared_note_store().await);
    let mut ada = connect(&coordinator, "ada@example.com", "Ada").await;
    let mut grace = connect(&coordinator, "grace@example.com", "Grace").await;

    ada.send(&coordinator, Command::AcquireLock { note_id: 42 }).await;
    grace.next_push().await; // noteLocked

    coordinator
        .disconnect(ada.session.as_ref(), ada.handle.conn_id())
        .await;

    assert!(
        !coordinator
            .registry()
            .is_online(&UserIdentity::new("ada@example.com"))
            .await
    );

    // The lock survives; the next editor still sees it held.
    let reply = grace.send(&coordinator, Command::LockStatus { note_id: 42 }).await;
    assert!(
        matches!(reply, Outbound::LockStatus { message, .. } if message == "status:Ada is editing this note")
    );
    grace.no_push();
}

#[tokio::test]
async fn test_disconnect_releases_locks_when_policy_enabled() {
    let coordinator = Coordinator::new(
        Arc::new(shared_note_store().await),
        Arc::new(JwtAuthService::new()),
        true,
    );
    let mut ada = connect(&coordinator, "ada@example.com", "Ada").await;
    let mut grace = connect(&coordinator, "grace@example.com", "Grace").await;

    ada.send(&coordinator, Command::AcquireLock { note_id: 42 }).await;
    grace.next_push().await; // noteLocked

    coordinator
        .disconnect(ada.session.as_ref(), ada.handle.conn_id())
        .await;

    assert!(coordinator.locks().get(42).await.is_free());
    assert!(matches!(grace.next_push().await, Outbound::NoteUnlocked { note_id: 42, .. }));
}

#[tokio::test]
async fn test_stale_disconnect_after_reconnect_keeps_newer_session() {
    let coordinator = Coordinator::new(
        Arc::new(shared_note_store().await),
        Arc::new(JwtAuthService::new()),
        true,
    );
    let ada_old = connect(&coordinator, "ada@example.com", "Ada").await;
    let mut ada_new = connect(&coordinator, "ada@example.com", "Ada").await;
    let mut grace = connect(&coordinator, "grace@example.com", "Grace").await;

    ada_new.send(&coordinator, Command::AcquireLock { note_id: 42 }).await;
    grace.next_push().await; // noteLocked

    // The replaced connection's disconnect arrives late. It must neither
    // evict the newer session nor release its locks.
    coordinator
        .disconnect(ada_old.session.as_ref(), ada_old.handle.conn_id())
        .await;

    assert!(
        coordinator
            .registry()
            .is_online(&UserIdentity::new("ada@example.com"))
            .await
    );
    assert!(!coordinator.locks().get(42).await.is_free());
    grace.no_push();
}

#[tokio::test]
async fn test_reconnect_routes_pushes_to_newest_connection() {
    let coordinator = coordinator(shared_note_store().await);
    let mut ada_old = connect(&coordinator, "ada@example.com", "Ada").await;
    let mut ada_new = connect(&coordinator, "ada@example.com", "Ada").await;
    let mut grace = connect(&coordinator, "grace@example.com", "Grace").await;

    grace.send(&coordinator, Command::AcquireLock { note_id: 42 }).await;

    assert!(matches!(ada_new.next_push().await, Outbound::NoteLocked { .. }));
    ada_old.no_push();
}

#[tokio::test]
async fn test_collaborator_added_pushes_to_online_target() {
    let store = InMemoryNoteStore::new();
    store.add_note(5, "Reading list").await;
    let coordinator = coordinator(store);
    let mut ada = connect(&coordinator, "ada@example.com", "Ada").await;
    let mut grace = connect(&coordinator, "grace@example.com", "Grace").await;

    let reply = ada
        .send(
            &coordinator,
            Command::CollaboratorAdded {
                note_id: 5,
                email: "grace@example.com".to_string(),
            },
        )
        .await;
    assert!(
        matches!(reply, Outbound::CollaboratorAdded { ref message, .. } if message.contains("was notified"))
    );

    match grace.next_push().await {
        Outbound::CollaboratorAdded { message, note_id } => {
            assert_eq!(note_id, 5);
            assert!(message.contains("Ada"));
            assert!(message.contains("Reading list"));
        }
        other => panic!("expected collaboratorAdded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_collaborator_added_reports_offline_target() {
    let store = InMemoryNoteStore::new();
    store.add_note(5, "Reading list").await;
    let coordinator = coordinator(store);
    let mut ada = connect(&coordinator, "ada@example.com", "Ada").await;

    let reply = ada
        .send(
            &coordinator,
            Command::CollaboratorAdded {
                note_id: 5,
                email: "ghost@example.com".to_string(),
            },
        )
        .await;
    assert!(
        matches!(reply, Outbound::CollaboratorAdded { ref message, .. } if message.contains("is offline"))
    );
}

/// Store that fails every query, standing in for a database outage.
struct FailingNoteStore;

#[async_trait]
impl NoteStore for FailingNoteStore {
    async fn collaborators(&self, _note_id: NoteId) -> Result<Vec<UserIdentity>, NoteStoreError> {
        Err(NoteStoreError("connection refused".to_string()))
    }

    async fn note_title(&self, _note_id: NoteId) -> Result<Option<String>, NoteStoreError> {
        Err(NoteStoreError("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_resolver_outage_degrades_but_lock_stands() {
    let coordinator = Coordinator::new(
        Arc::new(FailingNoteStore),
        Arc::new(JwtAuthService::new()),
        false,
    );
    let mut ada = connect(&coordinator, "ada@example.com", "Ada").await;

    let reply = ada.send(&coordinator, Command::AcquireLock { note_id: 42 }).await;
    match reply {
        Outbound::LockAcquired { message, note_id } => {
            assert_eq!(note_id, 42);
            assert!(message.contains("may not have been notified"));
        }
        other => panic!("expected degraded lockAcquired, got {:?}", other),
    }
    assert!(!coordinator.locks().get(42).await.is_free());

    // Releasing under the same outage: the note frees up and the caller
    // is likewise told the broadcast may not have gone out.
    let reply = ada.send(&coordinator, Command::ReleaseLock { note_id: 42 }).await;
    match reply {
        Outbound::LockReleased { message, note_id } => {
            assert_eq!(note_id, 42);
            assert!(message.contains("may not have been notified"));
        }
        other => panic!("expected degraded lockReleased, got {:?}", other),
    }
    assert!(coordinator.locks().get(42).await.is_free());

    // Lookups that need the title do fail outright.
    let reply = ada
        .send(
            &coordinator,
            Command::CollaboratorAdded {
                note_id: 42,
                email: "grace@example.com".to_string(),
            },
        )
        .await;
    assert!(matches!(reply, Outbound::Error { code, .. } if code == "resolver_failed"));
}

#[tokio::test]
async fn test_unauthenticated_commands_are_rejected() {
    let coordinator = coordinator(InMemoryNoteStore::new());
    let mut client = Client::new();

    for command in [
        Command::AcquireLock { note_id: 1 },
        Command::ReleaseLock { note_id: 1 },
        Command::LockStatus { note_id: 1 },
        Command::CollaboratorAdded {
            note_id: 1,
            email: "a@example.com".to_string(),
        },
    ] {
        let reply = client.send(&coordinator, command).await;
        assert!(matches!(reply, Outbound::Error { code, .. } if code == "not_authenticated"));
    }
    assert!(coordinator.locks().get(1).await.is_free());
}
