//! Endpoint-level client for the classroom backend
//!
//! One method per backend route. Each method performs exactly one request.
//! Group and exercise routes take the bearer token explicitly, so the caller
//! decides which token a request carries.

use crate::http::{ApiClientConfig, ApiError, ApiRequest, ApiResponse, HttpClient};
use crate::types::{
    Credentials, Exercise, Group, GroupUpdate, MessageResponse, NamedRef, NewExercise, NewGroup,
    NewUser, ParamsEnvelope, Profile, TokenPair, User,
};

/// Backend route paths
pub mod paths {
    /// User registration and listing
    pub const USERS: &str = "/users/";
    /// Token issue
    pub const TOKEN: &str = "/token/";
    /// Student listing
    pub const STUDENTS: &str = "/students/";
    /// Group collection
    pub const GROUPS: &str = "/groups/";
    /// Exercise collection
    pub const EXERCISES: &str = "/exercises/";
    /// Difficulty level lookup
    pub const LEVELS: &str = "/levels/";
    /// Programming language lookup
    pub const LANGUAGES: &str = "/languages/";
    /// Per-user profile, followed by `{username}/`
    pub const PROFILE: &str = "/profile/";
}

type Result<T> = std::result::Result<T, ApiError>;

fn encode_error(e: serde_json::Error) -> ApiError {
    ApiError::new(0, "EncodeError", format!("Failed to encode body: {}", e))
}

/// Typed client for every backend endpoint the application uses
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
}

impl ApiClient {
    /// Create a client from configuration
    pub fn new(config: ApiClientConfig) -> Result<Self> {
        Ok(Self { http: HttpClient::new(config)? })
    }

    /// Wrap an existing transport
    pub fn from_http(http: HttpClient) -> Self {
        Self { http }
    }

    /// Underlying transport
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Register a user account
    pub async fn create_user(&self, user: &NewUser) -> Result<ApiResponse<MessageResponse>> {
        let request = ApiRequest::post(paths::USERS)
            .json_body(user)
            .map_err(encode_error)?;
        self.send_message(request).await
    }

    /// Exchange credentials for a token pair
    pub async fn obtain_token(&self, credentials: &Credentials) -> Result<ApiResponse<TokenPair>> {
        let request = ApiRequest::post(paths::TOKEN)
            .json_body(credentials)
            .map_err(encode_error)?;
        self.http.send(request).await
    }

    /// List all users
    pub async fn list_users(&self) -> Result<ApiResponse<Vec<User>>> {
        self.http.send(ApiRequest::get(paths::USERS)).await
    }

    /// List users registered as students
    pub async fn list_students(&self) -> Result<ApiResponse<Vec<User>>> {
        self.http.send(ApiRequest::get(paths::STUDENTS)).await
    }

    /// List the groups visible to the token's owner
    pub async fn list_groups(&self, token: &str) -> Result<ApiResponse<Vec<Group>>> {
        self.http
            .send(ApiRequest::get(paths::GROUPS).bearer(token))
            .await
    }

    /// Create a group
    pub async fn create_group(
        &self,
        token: &str,
        group: &NewGroup,
    ) -> Result<ApiResponse<MessageResponse>> {
        let request = ApiRequest::post(paths::GROUPS)
            .bearer(token)
            .json_body(&ParamsEnvelope { params: group })
            .map_err(encode_error)?;
        self.send_message(request).await
    }

    /// Rename a group and change its membership
    pub async fn update_group(
        &self,
        token: &str,
        id: u64,
        update: &GroupUpdate,
    ) -> Result<ApiResponse<MessageResponse>> {
        let request = ApiRequest::put(format!("{}{}/", paths::GROUPS, id))
            .bearer(token)
            .json_body(&ParamsEnvelope { params: update })
            .map_err(encode_error)?;
        self.send_message(request).await
    }

    /// Delete a group
    pub async fn delete_group(&self, token: &str, id: u64) -> Result<ApiResponse<MessageResponse>> {
        let request = ApiRequest::delete(format!("{}{}", paths::GROUPS, id)).bearer(token);
        self.send_message(request).await
    }

    /// List the exercises visible to the token's owner
    pub async fn list_exercises(&self, token: &str) -> Result<ApiResponse<Vec<Exercise>>> {
        self.http
            .send(ApiRequest::get(paths::EXERCISES).bearer(token))
            .await
    }

    /// Create an exercise
    pub async fn create_exercise(
        &self,
        token: &str,
        exercise: &NewExercise,
    ) -> Result<ApiResponse<MessageResponse>> {
        let request = ApiRequest::post(paths::EXERCISES)
            .bearer(token)
            .json_body(&ParamsEnvelope { params: exercise })
            .map_err(encode_error)?;
        self.send_message(request).await
    }

    /// Delete an exercise
    pub async fn delete_exercise(
        &self,
        token: &str,
        id: u64,
    ) -> Result<ApiResponse<MessageResponse>> {
        let request = ApiRequest::delete(format!("{}{}", paths::EXERCISES, id)).bearer(token);
        self.send_message(request).await
    }

    /// List the difficulty levels an exercise can reference
    pub async fn list_levels(&self) -> Result<ApiResponse<Vec<NamedRef>>> {
        self.http.send(ApiRequest::get(paths::LEVELS)).await
    }

    /// List the programming languages an exercise can reference
    pub async fn list_languages(&self) -> Result<ApiResponse<Vec<NamedRef>>> {
        self.http.send(ApiRequest::get(paths::LANGUAGES)).await
    }

    /// Fetch the profile of a user, which carries the account type
    pub async fn get_profile(&self, username: &str) -> Result<ApiResponse<Profile>> {
        let path = format!("{}{}/", paths::PROFILE, username);
        self.http.send(ApiRequest::get(path)).await
    }

    async fn send_message(&self, request: ApiRequest) -> Result<ApiResponse<MessageResponse>> {
        let response: ApiResponse<Option<MessageResponse>> = self.http.send(request).await?;
        Ok(response.map(Option::unwrap_or_default))
    }
}
