//! WebSocket Gateway Handler
//!
//! One tokio task per connection. The socket loop multiplexes four
//! concerns with `select!`:
//!
//! - inbound frames, decoded to commands and handed to the coordinator
//! - the connection's outbound channel, drained to the wire
//! - server-side heartbeat pings, with disconnect on missing pongs
//! - an idle deadline for connections that never authenticate
//!
//! Malformed frames produce an `error` envelope to this socket only and
//! touch no shared state. When the transport closes, a synthetic
//! disconnect is forwarded to the coordinator before the task exits; any
//! writes that fail because the peer vanished are dropped silently.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, Instant};

use crate::backend::auth::service::AuthIdentity;
use crate::backend::error::CoordinatorError;
use crate::backend::presence::registry::ConnectionHandle;
use crate::backend::server::state::AppState;
use crate::shared::command::Command;
use crate::shared::notify::Outbound;

/// Handle `GET /ws`: upgrade to a WebSocket connection.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, mut socket: WebSocket) {
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Outbound>();
    let handle = ConnectionHandle::new(outbound_tx);
    let mut session: Option<AuthIdentity> = None;

    tracing::info!(conn_id = %handle.conn_id(), "connection opened");

    let mut heartbeat = interval(state.config.heartbeat_interval);
    heartbeat.reset(); // skip the immediate first tick
    let heartbeat_timeout = state.config.heartbeat_interval * 2;
    let mut last_pong = Instant::now();

    // Connections that never authenticate expose no lock-bearing identity
    // and are closed after the idle window.
    let auth_deadline = sleep(state.config.auth_idle_timeout);
    tokio::pin!(auth_deadline);

    loop {
        tokio::select! {
            _ = &mut auth_deadline, if session.is_none() => {
                tracing::info!(conn_id = %handle.conn_id(), "closing unauthenticated idle connection");
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            _ = heartbeat.tick() => {
                if last_pong.elapsed() > heartbeat_timeout {
                    tracing::info!(conn_id = %handle.conn_id(), "heartbeat timeout, disconnecting");
                    break;
                }
                if socket.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
            maybe_outbound = outbound_rx.recv() => {
                match maybe_outbound {
                    Some(outbound) => {
                        if socket.send(Message::Text(outbound.encode().into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            maybe_message = socket.recv() => {
                let Some(message) = maybe_message else {
                    break;
                };

                match message {
                    Ok(Message::Text(raw)) => {
                        match Command::decode(&raw) {
                            Ok(command) => {
                                let reply = state
                                    .coordinator
                                    .handle(&handle, &mut session, command)
                                    .await;
                                handle.send(reply);
                            }
                            Err(decode_error) => {
                                tracing::debug!(
                                    conn_id = %handle.conn_id(),
                                    error = %decode_error,
                                    "malformed frame"
                                );
                                let error = CoordinatorError::UnknownCommand(
                                    decode_error.to_string(),
                                );
                                handle.send(error.to_outbound());
                            }
                        }
                    }
                    Ok(Message::Ping(payload)) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Pong(_)) => {
                        last_pong = Instant::now();
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {} // binary frames are not part of the protocol
                    Err(error) => {
                        tracing::debug!(conn_id = %handle.conn_id(), error = %error, "socket error");
                        break;
                    }
                }
            }
        }
    }

    // Synthetic disconnect: finish registry cleanup before the handle and
    // its channel are dropped.
    state
        .coordinator
        .disconnect(session.as_ref(), handle.conn_id())
        .await;

    let connected_secs = (chrono::Utc::now() - handle.connected_at()).num_seconds();
    tracing::info!(conn_id = %handle.conn_id(), connected_secs, "connection closed");
}
