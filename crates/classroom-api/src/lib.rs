//! Classroom backend client library
//!
//! This crate provides the HTTP transport, typed record shapes and an
//! endpoint-level client for the classroom backend (users, tokens, groups,
//! exercises).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod http;
pub mod types;

pub use client::ApiClient;
pub use http::{ApiClientConfig, ApiError, ApiRequest, ApiResponse, HttpClient, HttpMethod};
pub use types::{
    Credentials, Exercise, Group, GroupUpdate, MessageResponse, NamedRef, NewExercise, NewGroup,
    NewUser, Profile, TokenPair, User, UserRef, UserType,
};

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, ApiError>;
