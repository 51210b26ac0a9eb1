//! Server Configuration
//!
//! Configuration is loaded from environment variables with sensible local
//! defaults. A missing or unreachable database does not prevent startup:
//! the coordinator falls back to an in-memory note store, so presence and
//! locking keep working while collaborator broadcasts simply resolve to
//! nobody until the database is back.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::backend::notes::store::{InMemoryNoteStore, NoteStore, PgNoteStore};

/// Default WebSocket listen port, matching the product's dev setup.
const DEFAULT_PORT: u16 = 3001;

/// Runtime settings for the coordinator process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port (`SERVER_PORT`)
    pub port: u16,
    /// Whether a disconnect releases the locks its identity held
    /// (`RELEASE_LOCKS_ON_DISCONNECT`, default false)
    pub release_locks_on_disconnect: bool,
    /// How long an unauthenticated connection may idle before being
    /// closed (`AUTH_IDLE_TIMEOUT_SECS`, default 60)
    pub auth_idle_timeout: Duration,
    /// Interval between server heartbeat pings
    /// (`HEARTBEAT_INTERVAL_SECS`, default 30)
    pub heartbeat_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            release_locks_on_disconnect: false,
            auth_idle_timeout: Duration::from_secs(60),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("SERVER_PORT", defaults.port),
            release_locks_on_disconnect: env_flag(
                "RELEASE_LOCKS_ON_DISCONNECT",
                defaults.release_locks_on_disconnect,
            ),
            auth_idle_timeout: Duration::from_secs(env_parse(
                "AUTH_IDLE_TIMEOUT_SECS",
                defaults.auth_idle_timeout.as_secs(),
            )),
            heartbeat_interval: Duration::from_secs(env_parse(
                "HEARTBEAT_INTERVAL_SECS",
                defaults.heartbeat_interval.as_secs(),
            )),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} value {:?}, using default", name, value);
            default
        }),
        Err(_) => default,
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Connect the read-only note store.
///
/// Reads `DATABASE_URL`; on any failure the server continues with an
/// empty in-memory store rather than refusing to start.
pub async fn load_note_store() -> Arc<dyn NoteStore> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory note store");
            return Arc::new(InMemoryNoteStore::new());
        }
    };

    tracing::info!("Connecting to note store database...");

    match PgPool::connect(&database_url).await {
        Ok(pool) => {
            tracing::info!("Note store connection pool created");
            Arc::new(PgNoteStore::new(pool))
        }
        Err(error) => {
            tracing::error!("Failed to connect note store: {:?}", error);
            tracing::warn!("Falling back to in-memory note store");
            Arc::new(InMemoryNoteStore::new())
        }
    }
}
