//! Classroom client
//!
//! Facade over the workspace crates: durable storage, the backend client and
//! the observable session store.

#![warn(missing_docs)]

pub use app_state::{
    LogoutPolicy, Session, SessionStore, StoreConfig, StoreError, StoreEvent,
};
pub use classroom_api::{self as api, ApiClient, ApiClientConfig, ApiError};
pub use storage::{DurableStorage, KvConfig, KvStore};
