//! Connection Gateway
//!
//! Accepts WebSocket upgrades, parses inbound frames into commands, and
//! writes coordinator output back to the wire. The gateway owns the socket
//! for its whole lifetime; everything else only ever holds the sending
//! half of the connection's outbound channel.

/// WebSocket upgrade and per-connection socket loop
pub mod handler;

pub use handler::ws_upgrade;
