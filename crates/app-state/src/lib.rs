//! Application state for the classroom client
//!
//! This crate provides the observable session store: the durable session,
//! the cached user/group/exercise lists and the actions that fill them from
//! the backend.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod session;
pub mod store;

pub use session::{LogoutPolicy, Session, SessionState};
pub use store::{
    SessionStore, StoreConfig, StoreError, StoreEvent, GROUPS_FETCH_ALERT, INVALID_TOKEN_KIND,
};
