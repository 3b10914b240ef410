//! Storage layer for the classroom client
//!
//! This crate provides the durable key-value store and the session key
//! layout persisted across restarts.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kv;
pub mod session_keys;

pub use kv::{DurableStorage, KvConfig, KvError, KvStore};
pub use session_keys::{
    is_live_token, SessionKeys, LOGGED_OUT_SENTINEL, TOKEN_KEY, USERNAME_KEY,
};
