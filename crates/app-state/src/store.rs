//! The session store
//!
//! [`SessionStore`] is the explicit context object views hold on to. It owns
//! the session slot, the cached user/group/exercise lists and the backend
//! client. Actions perform one request each and commit the response into
//! state; lists are replaced wholesale.
//!
//! # Example
//!
//! ```rust,no_run
//! use app_state::{SessionStore, StoreConfig};
//! use classroom_api::{ApiClient, ApiClientConfig, Credentials};
//! use std::sync::Arc;
//! use storage::{KvConfig, KvStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = Arc::new(KvStore::new(KvConfig::new("classroom.db"))?);
//!     let api = ApiClient::new(ApiClientConfig::default())?;
//!     let store = SessionStore::new(storage, api, StoreConfig::default());
//!     store.initialize();
//!
//!     store.login_user(&Credentials::new("alice", "secret")).await?;
//!     store.get_all_groups().await?;
//!     println!("{} groups", store.groups().len());
//!     Ok(())
//! }
//! ```

use crate::session::{LogoutPolicy, Session, SessionState};
use classroom_api::{
    ApiClient, ApiError, ApiResponse, Credentials, Exercise, Group, GroupUpdate, MessageResponse,
    NewExercise, NewGroup, NewUser, User,
};
use std::sync::Arc;
use storage::{is_live_token, DurableStorage, KvError};
use tokio::sync::{broadcast, watch};

/// Message carried by the alert raised when groups cannot be fetched
pub const GROUPS_FETCH_ALERT: &str = "Failed to fetch groups";

/// Error kind returned when a login response holds no usable token
pub const INVALID_TOKEN_KIND: &str = "InvalidToken";

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend request failed
    #[error("Request failed: {0}")]
    Request(#[from] ApiError),

    /// Durable storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] KvError),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Events broadcast to views
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A login committed a new token
    LoggedIn {
        /// Username the login was made with
        username: String,
    },
    /// The session was logged out
    LoggedOut,
    /// A failure the user must acknowledge
    Alert {
        /// Text to show
        message: String,
    },
}

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// What logout does to the stored token
    pub logout_policy: LogoutPolicy,
    /// Capacity of the event channel
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { logout_policy: LogoutPolicy::WriteSentinel, event_capacity: 16 }
    }
}

impl StoreConfig {
    /// Set the logout policy
    pub fn logout_policy(mut self, policy: LogoutPolicy) -> Self {
        self.logout_policy = policy;
        self
    }

    /// Set the event channel capacity
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

struct Inner {
    api: ApiClient,
    session: SessionState,
    users: watch::Sender<Vec<User>>,
    groups: watch::Sender<Vec<Group>>,
    exercises: watch::Sender<Vec<Exercise>>,
    events: broadcast::Sender<StoreEvent>,
}

/// Observable session and data store
///
/// Cloning is cheap; clones share the same state. No lock is held across a
/// request, so concurrent fetches of the same list commit in completion order
/// and the last response to arrive wins.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &self.inner.session)
            .field("users", &self.inner.users.borrow().len())
            .field("groups", &self.inner.groups.borrow().len())
            .field("exercises", &self.inner.exercises.borrow().len())
            .finish()
    }
}

impl SessionStore {
    /// Create a store; call [`SessionStore::initialize`] before use
    pub fn new(storage: Arc<dyn DurableStorage>, api: ApiClient, config: StoreConfig) -> Self {
        let (users, _) = watch::channel(Vec::new());
        let (groups, _) = watch::channel(Vec::new());
        let (exercises, _) = watch::channel(Vec::new());
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            inner: Arc::new(Inner {
                api,
                session: SessionState::new(storage, config.logout_policy),
                users,
                groups,
                exercises,
                events,
            }),
        }
    }

    // =========================================================================
    // State accessors and mutators
    // =========================================================================

    /// Load the session from durable storage
    pub fn initialize(&self) -> Session {
        self.inner.session.initialize()
    }

    /// Persist and commit a token
    pub fn set_token(&self, token: &str) -> Result<()> {
        Ok(self.inner.session.set_token(token)?)
    }

    /// Persist and commit the username
    pub fn set_username(&self, username: &str) -> Result<()> {
        Ok(self.inner.session.set_username(username)?)
    }

    /// Log out
    ///
    /// The in-memory session is cleared even if storage fails.
    pub fn logout(&self) -> Result<()> {
        let result = self.inner.session.logout();
        tracing::info!("logged out");
        self.emit(StoreEvent::LoggedOut);
        Ok(result?)
    }

    /// Replace the user list
    pub fn replace_users(&self, users: Vec<User>) {
        self.inner.users.send_replace(users);
    }

    /// Replace the group list
    pub fn replace_groups(&self, groups: Vec<Group>) {
        self.inner.groups.send_replace(groups);
    }

    /// Replace the exercise list
    pub fn replace_exercises(&self, exercises: Vec<Exercise>) {
        self.inner.exercises.send_replace(exercises);
    }

    /// Current session
    pub fn session(&self) -> Session {
        self.inner.session.snapshot()
    }

    /// Current token
    pub fn token(&self) -> Option<String> {
        self.inner.session.snapshot().token
    }

    /// Whether a live token is held
    pub fn is_logged(&self) -> bool {
        self.inner.session.snapshot().is_logged
    }

    /// Cached users
    pub fn users(&self) -> Vec<User> {
        self.inner.users.borrow().clone()
    }

    /// Cached groups
    pub fn groups(&self) -> Vec<Group> {
        self.inner.groups.borrow().clone()
    }

    /// Cached exercises
    pub fn exercises(&self) -> Vec<Exercise> {
        self.inner.exercises.borrow().clone()
    }

    /// Subscribe to session changes
    pub fn subscribe_session(&self) -> watch::Receiver<Session> {
        self.inner.session.subscribe()
    }

    /// Subscribe to user list changes
    pub fn subscribe_users(&self) -> watch::Receiver<Vec<User>> {
        self.inner.users.subscribe()
    }

    /// Subscribe to group list changes
    pub fn subscribe_groups(&self) -> watch::Receiver<Vec<Group>> {
        self.inner.groups.subscribe()
    }

    /// Subscribe to exercise list changes
    pub fn subscribe_exercises(&self) -> watch::Receiver<Vec<Exercise>> {
        self.inner.exercises.subscribe()
    }

    /// Subscribe to store events
    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    /// Backend client
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    fn emit(&self, event: StoreEvent) {
        // No receivers is fine.
        let _ = self.inner.events.send(event);
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Register a user account
    pub async fn create_user(&self, user: &NewUser) -> Result<ApiResponse<MessageResponse>> {
        tracing::debug!(username = %user.username, "sending registration request");

        match self.inner.api.create_user(user).await {
            Ok(response) => {
                tracing::info!(message = %response.data.message, "registration response");
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(error = %e, "registration failed");
                Err(e.into())
            }
        }
    }

    /// Log in and commit the issued token
    ///
    /// A response without a usable access token is rejected before anything
    /// is stored. Once the token is committed the login succeeds; a failure
    /// to store the username is only logged.
    pub async fn login_user(&self, credentials: &Credentials) -> Result<()> {
        tracing::debug!(username = %credentials.username, "sending login request");

        let response = self
            .inner
            .api
            .obtain_token(credentials)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "login failed"))?;

        if !is_live_token(&response.data.access) {
            tracing::warn!(status = response.status, "token response carried no access token");
            return Err(ApiError::new(
                response.status,
                INVALID_TOKEN_KIND,
                "Token response carried no access token",
            )
            .into());
        }

        if let Err(e) = self.inner.session.set_token(&response.data.access) {
            let committed = self.inner.session.snapshot().token;
            if committed.as_deref() != Some(response.data.access.as_str()) {
                return Err(e.into());
            }
            tracing::warn!(error = %e, "token stored but not flushed");
        }
        if let Err(e) = self.inner.session.set_username(&credentials.username) {
            tracing::warn!(error = %e, "failed to store username");
        }

        tracing::info!(username = %credentials.username, "logged in");
        self.emit(StoreEvent::LoggedIn { username: credentials.username.clone() });
        Ok(())
    }

    /// Fetch all users and replace the user list
    pub async fn get_all_users(&self) -> Result<()> {
        tracing::debug!("fetching users");

        let response = self
            .inner
            .api
            .list_users()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "failed to fetch users"))?;
        self.replace_users(response.data);
        Ok(())
    }

    /// Fetch students and replace the user list
    pub async fn get_all_students(&self) -> Result<()> {
        tracing::debug!("fetching students");

        let response = self
            .inner
            .api
            .list_students()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "failed to fetch students"))?;
        self.replace_users(response.data);
        Ok(())
    }

    /// Fetch groups and replace the group list
    ///
    /// On failure a [`StoreEvent::Alert`] is broadcast as well.
    pub async fn get_all_groups(&self) -> Result<()> {
        tracing::debug!("fetching groups");
        let token = self.inner.session.bearer_token();

        match self.inner.api.list_groups(&token).await {
            Ok(response) => {
                self.replace_groups(response.data);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch groups");
                self.emit(StoreEvent::Alert { message: GROUPS_FETCH_ALERT.to_string() });
                Err(e.into())
            }
        }
    }

    /// Create a group
    pub async fn create_group(&self, group: &NewGroup) -> Result<ApiResponse<MessageResponse>> {
        let token = self.inner.session.bearer_token();
        Ok(self.inner.api.create_group(&token, group).await?)
    }

    /// Update a group
    pub async fn update_group(
        &self,
        id: u64,
        update: &GroupUpdate,
    ) -> Result<ApiResponse<MessageResponse>> {
        let token = self.inner.session.bearer_token();
        Ok(self.inner.api.update_group(&token, id, update).await?)
    }

    /// Delete a group
    pub async fn delete_group(&self, id: u64) -> Result<ApiResponse<MessageResponse>> {
        let token = self.inner.session.bearer_token();
        let response = self.inner.api.delete_group(&token, id).await?;
        tracing::debug!(id, status = response.status, "group deleted");
        Ok(response)
    }

    /// Fetch exercises and replace the exercise list
    pub async fn get_all_exercises(&self) -> Result<()> {
        tracing::debug!("fetching exercises");
        let token = self.inner.session.bearer_token();

        let response = self
            .inner
            .api
            .list_exercises(&token)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "failed to fetch exercises"))?;
        self.replace_exercises(response.data);
        Ok(())
    }

    /// Create an exercise
    pub async fn create_exercise(
        &self,
        exercise: &NewExercise,
    ) -> Result<ApiResponse<MessageResponse>> {
        let token = self.inner.session.bearer_token();
        let response = self.inner.api.create_exercise(&token, exercise).await?;
        tracing::debug!(message = %response.data.message, "exercise created");
        Ok(response)
    }

    /// Delete an exercise
    pub async fn delete_exercise(&self, id: u64) -> Result<ApiResponse<MessageResponse>> {
        let token = self.inner.session.bearer_token();
        Ok(self.inner.api.delete_exercise(&token, id).await?)
    }
}
