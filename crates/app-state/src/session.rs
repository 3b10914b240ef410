//! Session state backed by durable storage
//!
//! The in-memory [`Session`] mirrors the `token` and `username` keys. It is
//! published through a `watch` channel so views re-render when it changes.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{DurableStorage, KvError, SessionKeys};
use tokio::sync::watch;

/// Current authentication state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token, `None` when logged out
    pub token: Option<String>,
    /// True iff a live token is stored
    pub is_logged: bool,
    /// Username of the last login, empty if unknown
    pub username: String,
}

impl Session {
    fn from_storage(token: Option<String>, username: Option<String>) -> Self {
        Self {
            is_logged: token.is_some(),
            token,
            username: username.unwrap_or_default(),
        }
    }
}

/// What logout does to the `token` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogoutPolicy {
    /// Overwrite the token with the string `"null"`
    #[default]
    WriteSentinel,
    /// Delete the token key
    RemoveKey,
}

/// Session slot of the store
pub struct SessionState {
    keys: SessionKeys,
    tx: watch::Sender<Session>,
    logout_policy: LogoutPolicy,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("session", &*self.tx.borrow())
            .field("logout_policy", &self.logout_policy)
            .finish()
    }
}

impl SessionState {
    /// Create an empty session over a storage backend
    pub fn new(storage: Arc<dyn DurableStorage>, logout_policy: LogoutPolicy) -> Self {
        let (tx, _) = watch::channel(Session::default());
        Self { keys: SessionKeys::new(storage), tx, logout_policy }
    }

    /// Load token and username from durable storage
    ///
    /// Never fails: unreadable values are logged and treated as absent.
    pub fn initialize(&self) -> Session {
        let token = self.keys.live_token().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read stored token");
            None
        });
        let username = self.keys.username().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read stored username");
            None
        });

        let session = Session::from_storage(token, username);
        tracing::debug!(is_logged = session.is_logged, "session initialized");
        self.tx.send_replace(session.clone());
        session
    }

    /// Persist a token and reload it into memory
    ///
    /// The token is stored as given; an empty token leaves the session logged
    /// out. Memory is reloaded from storage even when the write reports an
    /// error, since a failed flush can still leave the new value in place.
    pub fn set_token(&self, token: &str) -> Result<(), KvError> {
        let written = self.keys.set_token(token);

        match self.keys.live_token() {
            Ok(stored) => self.tx.send_modify(|session| {
                session.is_logged = stored.is_some();
                session.token = stored;
            }),
            Err(read_error) => {
                written?;
                return Err(read_error);
            }
        }
        written
    }

    /// Persist the username and mirror it into memory
    pub fn set_username(&self, username: &str) -> Result<(), KvError> {
        self.keys.set_username(username)?;
        self.tx.send_modify(|session| session.username = username.to_string());
        Ok(())
    }

    /// Clear the token in memory and in durable storage
    ///
    /// Memory is cleared even when the storage write fails.
    pub fn logout(&self) -> Result<(), KvError> {
        self.tx.send_modify(|session| {
            session.token = None;
            session.is_logged = false;
        });

        match self.logout_policy {
            LogoutPolicy::WriteSentinel => self.keys.write_logged_out(),
            LogoutPolicy::RemoveKey => self.keys.remove_token().map(|_| ()),
        }
    }

    /// Snapshot of the current session
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Token for the Authorization header, empty when logged out
    pub fn bearer_token(&self) -> String {
        self.tx.borrow().token.clone().unwrap_or_default()
    }

    /// Subscribe to session changes
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use storage::{KvStore, LOGGED_OUT_SENTINEL, TOKEN_KEY, USERNAME_KEY};

    mock! {
        Storage {}
        impl DurableStorage for Storage {
            fn get_string(&self, key: &str) -> storage::kv::Result<Option<String>>;
            fn set_string(&self, key: &str, value: &str) -> storage::kv::Result<()>;
            fn remove_key(&self, key: &str) -> storage::kv::Result<bool>;
            fn flush_all(&self) -> storage::kv::Result<()>;
        }
    }

    fn storage_failure() -> KvError {
        KvError::Serialization(serde_json::from_str::<String>("not json").unwrap_err())
    }

    fn in_memory() -> (Arc<KvStore>, SessionState) {
        let kv = Arc::new(KvStore::in_memory().unwrap());
        let state = SessionState::new(kv.clone(), LogoutPolicy::default());
        (kv, state)
    }

    #[test]
    fn test_initialize_with_stored_token() {
        let (kv, state) = in_memory();
        kv.set_string(TOKEN_KEY, "abc").unwrap();
        kv.set_string(USERNAME_KEY, "alice").unwrap();

        let session = state.initialize();

        assert!(session.is_logged);
        assert_eq!(session.token, Some("abc".to_string()));
        assert_eq!(session.username, "alice");
        assert_eq!(state.snapshot(), session);
    }

    #[test]
    fn test_initialize_without_token() {
        let (_kv, state) = in_memory();
        let session = state.initialize();

        assert!(!session.is_logged);
        assert_eq!(session.token, None);
        assert_eq!(session.username, "");
    }

    #[test]
    fn test_initialize_after_sentinel_logout() {
        let (kv, state) = in_memory();
        kv.set_string(TOKEN_KEY, LOGGED_OUT_SENTINEL).unwrap();

        let session = state.initialize();
        assert!(!session.is_logged);
        assert_eq!(session.token, None);
    }

    #[test]
    fn test_set_token() {
        let (kv, state) = in_memory();
        state.initialize();

        state.set_token("xyz").unwrap();

        assert_eq!(kv.get_string(TOKEN_KEY).unwrap(), Some("xyz".to_string()));
        let session = state.snapshot();
        assert_eq!(session.token, Some("xyz".to_string()));
        assert!(session.is_logged);
        assert_eq!(state.bearer_token(), "xyz");
    }

    #[test]
    fn test_set_empty_token_is_not_logged_in() {
        let (_kv, state) = in_memory();
        state.set_token("").unwrap();
        assert!(!state.snapshot().is_logged);
    }

    #[test]
    fn test_logout_writes_sentinel() {
        let (kv, state) = in_memory();
        state.set_token("xyz").unwrap();

        state.logout().unwrap();

        let session = state.snapshot();
        assert_eq!(session.token, None);
        assert!(!session.is_logged);
        assert_eq!(state.bearer_token(), "");
        assert_eq!(kv.get_string(TOKEN_KEY).unwrap(), Some("null".to_string()));
    }

    #[test]
    fn test_logout_keeps_username() {
        let (_kv, state) = in_memory();
        state.set_token("xyz").unwrap();
        state.set_username("alice").unwrap();

        state.logout().unwrap();
        assert_eq!(state.snapshot().username, "alice");
    }

    #[test]
    fn test_logout_remove_key_policy() {
        let mut storage = MockStorage::new();
        storage
            .expect_remove_key()
            .withf(|key: &str| key == TOKEN_KEY)
            .times(1)
            .returning(|_| Ok(true));
        storage.expect_flush_all().returning(|| Ok(()));

        let state = SessionState::new(Arc::new(storage), LogoutPolicy::RemoveKey);
        state.logout().unwrap();

        assert!(!state.snapshot().is_logged);
    }

    #[test]
    fn test_initialize_tolerates_storage_failure() {
        let mut storage = MockStorage::new();
        storage
            .expect_get_string()
            .returning(|_| Err(storage_failure()));

        let state = SessionState::new(Arc::new(storage), LogoutPolicy::default());
        let session = state.initialize();

        assert_eq!(session, Session::default());
    }

    #[test]
    fn test_set_token_failure_leaves_state_unchanged() {
        let mut storage = MockStorage::new();
        storage
            .expect_set_string()
            .returning(|_, _| Err(storage_failure()));
        storage.expect_get_string().returning(|_| Ok(None));

        let state = SessionState::new(Arc::new(storage), LogoutPolicy::default());
        assert!(state.set_token("xyz").is_err());
        assert_eq!(state.snapshot(), Session::default());
    }

    #[test]
    fn test_set_token_flush_failure_mirrors_stored_value() {
        let mut storage = MockStorage::new();
        storage
            .expect_set_string()
            .withf(|key: &str, value: &str| key == TOKEN_KEY && value == "xyz")
            .times(1)
            .returning(|_, _| Ok(()));
        storage
            .expect_flush_all()
            .times(1)
            .returning(|| Err(storage_failure()));
        storage
            .expect_get_string()
            .withf(|key: &str| key == TOKEN_KEY)
            .returning(|_| Ok(Some("xyz".to_string())));

        let state = SessionState::new(Arc::new(storage), LogoutPolicy::default());

        assert!(state.set_token("xyz").is_err());
        let session = state.snapshot();
        assert_eq!(session.token, Some("xyz".to_string()));
        assert!(session.is_logged);
    }

    #[test]
    fn test_logout_clears_memory_when_storage_fails() {
        let mut storage = MockStorage::new();
        storage
            .expect_set_string()
            .returning(|_, _| Err(storage_failure()));

        let state = SessionState::new(Arc::new(storage), LogoutPolicy::WriteSentinel);
        state.tx.send_replace(Session {
            token: Some("abc".to_string()),
            is_logged: true,
            username: String::new(),
        });

        assert!(state.logout().is_err());
        assert_eq!(state.snapshot().token, None);
        assert!(!state.snapshot().is_logged);
    }

    #[tokio::test]
    async fn test_subscribers_see_token_changes() {
        let (_kv, state) = in_memory();
        let mut rx = state.subscribe();

        state.set_token("xyz").unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().token, Some("xyz".to_string()));
    }
}
