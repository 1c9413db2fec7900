//! Shared application state.
//!
//! `CoreState` is the explicit context every handler receives: the store
//! connection, the session registry and the donor notifier. Session state
//! changes at three points only: start-up (empty registry), sign-in
//! (`issue`) and sign-out (`revoke`).

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;

use crate::config::{self, AppConfig};
use crate::db::{self, DatabaseError};
use crate::session::{Identity, SessionRegistry};
use crate::urgent::{DonorNotifier, LogNotifier};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("State lock poisoned")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

pub struct CoreState {
    /// Single store connection; handlers lock it per operation and never
    /// hold the guard across an `.await`.
    db: Mutex<Connection>,
    sessions: Mutex<SessionRegistry>,
    notifier: Arc<dyn DonorNotifier>,
}

impl CoreState {
    /// Build state around an already migrated connection.
    pub fn new(conn: Connection, session_ttl: Duration) -> Self {
        Self {
            db: Mutex::new(conn),
            sessions: Mutex::new(SessionRegistry::new(session_ttl)),
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Open (and migrate) the configured database file.
    pub fn open(config: &AppConfig) -> Result<Self, CoreError> {
        let conn = db::open_database(&config.db_path)?;
        tracing::info!(path = %config.db_path.display(), "Database opened");
        Ok(Self::new(conn, config.session_ttl))
    }

    /// In-memory store with default session lifetime (tests, demos).
    pub fn in_memory() -> Result<Self, CoreError> {
        let conn = db::open_memory_database()?;
        Ok(Self::new(
            conn,
            Duration::from_secs(config::DEFAULT_SESSION_TTL_SECS),
        ))
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn DonorNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Lock the store connection.
    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.db.lock().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn notifier(&self) -> Arc<dyn DonorNotifier> {
        Arc::clone(&self.notifier)
    }

    // ── Session lifecycle ──────────────────────────────────

    pub fn start_session(&self, identity: Identity) -> Result<String, CoreError> {
        let mut sessions = self.sessions.lock().map_err(|_| CoreError::LockPoisoned)?;
        Ok(sessions.issue(identity))
    }

    /// Current identity for a bearer token, or `None`.
    pub fn current_identity(&self, token: &str) -> Result<Option<Identity>, CoreError> {
        let mut sessions = self.sessions.lock().map_err(|_| CoreError::LockPoisoned)?;
        Ok(sessions.resolve(token))
    }

    pub fn end_session(&self, token: &str) -> Result<bool, CoreError> {
        let mut sessions = self.sessions.lock().map_err(|_| CoreError::LockPoisoned)?;
        Ok(sessions.revoke(token))
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions
            .lock()
            .map(|s| s.active_count())
            .unwrap_or(0)
    }

    /// Path-independent check that the store answers queries.
    pub fn store_ready(&self) -> bool {
        self.db()
            .ok()
            .and_then(|conn| db::count_tables(&conn).ok())
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn session_lifecycle_through_core_state() {
        let core = CoreState::in_memory().unwrap();
        assert_eq!(core.active_sessions(), 0);

        let who = Identity {
            account_id: Uuid::new_v4(),
            email: "a@example.com".into(),
        };
        let token = core.start_session(who.clone()).unwrap();
        assert_eq!(core.current_identity(&token).unwrap(), Some(who));
        assert_eq!(core.active_sessions(), 1);

        assert!(core.end_session(&token).unwrap());
        assert_eq!(core.current_identity(&token).unwrap(), None);
    }

    #[test]
    fn in_memory_store_is_ready() {
        let core = CoreState::in_memory().unwrap();
        assert!(core.store_ready());
    }

    #[test]
    fn open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ll.db");
        let config = AppConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            db_path: path.clone(),
            session_ttl: Duration::from_secs(60),
            trusted_proxies: Vec::new(),
        };
        let core = CoreState::open(&config).unwrap();
        assert!(core.store_ready());
        assert!(path.exists());
    }
}
