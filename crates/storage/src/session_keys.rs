//! Durable session keys
//!
//! The session lives under two flat keys, `token` and `username`. A logged-out
//! session may hold the literal string `"null"` under `token`; readers treat it
//! the same as an absent key.

use crate::kv::{DurableStorage, Result};
use std::sync::Arc;

/// Storage key holding the bearer token
pub const TOKEN_KEY: &str = "token";

/// Storage key holding the username
pub const USERNAME_KEY: &str = "username";

/// Value written to `token` on logout
pub const LOGGED_OUT_SENTINEL: &str = "null";

/// Whether a raw stored token value represents a live session
pub fn is_live_token(raw: &str) -> bool {
    !raw.is_empty() && raw != LOGGED_OUT_SENTINEL
}

/// Typed access to the session keys of a [`DurableStorage`]
#[derive(Clone)]
pub struct SessionKeys {
    storage: Arc<dyn DurableStorage>,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}

impl SessionKeys {
    /// Wrap a storage backend
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self { storage }
    }

    /// Raw token value, including the logged-out sentinel
    pub fn raw_token(&self) -> Result<Option<String>> {
        self.storage.get_string(TOKEN_KEY)
    }

    /// Token value if it represents a live session
    pub fn live_token(&self) -> Result<Option<String>> {
        Ok(self.raw_token()?.filter(|raw| is_live_token(raw)))
    }

    /// Store a token as-is
    pub fn set_token(&self, token: &str) -> Result<()> {
        self.storage.set_string(TOKEN_KEY, token)?;
        self.storage.flush_all()
    }

    /// Overwrite the token with [`LOGGED_OUT_SENTINEL`]
    pub fn write_logged_out(&self) -> Result<()> {
        self.storage.set_string(TOKEN_KEY, LOGGED_OUT_SENTINEL)?;
        self.storage.flush_all()
    }

    /// Delete the token key
    pub fn remove_token(&self) -> Result<bool> {
        let removed = self.storage.remove_key(TOKEN_KEY)?;
        self.storage.flush_all()?;
        Ok(removed)
    }

    /// Stored username
    pub fn username(&self) -> Result<Option<String>> {
        self.storage.get_string(USERNAME_KEY)
    }

    /// Store the username
    pub fn set_username(&self, username: &str) -> Result<()> {
        self.storage.set_string(USERNAME_KEY, username)?;
        self.storage.flush_all()
    }
}
