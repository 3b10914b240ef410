//! HTTP transport for the classroom backend
//!
//! Request/response types, the single request-failed error, and the reqwest
//! client that sends exactly one request per call. There is no retry and, by
//! default, no timeout.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Base URL of the backend when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

// =============================================================================
// Error Types
// =============================================================================

/// A failed request
///
/// Transport failures, non-2xx responses and undecodable bodies all land
/// here. `status` is 0 when no HTTP response was obtained or the body could
/// not be decoded.
///
/// # Examples
/// ```
/// use classroom_api::http::ApiError;
///
/// let error = ApiError::new(401, "Unauthorized", "Invalid token");
/// assert_eq!(error.status(), 401);
/// assert!(error.is_unauthorized());
/// assert!(!error.is_transport_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("request failed ({status}): {kind} - {message}")]
pub struct ApiError {
    status: u16,
    kind: String,
    message: String,
}

impl ApiError {
    /// Create a new error
    pub fn new(status: u16, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self { status, kind: kind.into(), message: message.into() }
    }

    /// Error for a request that never produced a response
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(0, "NetworkError", message)
    }

    /// Error for a response body that could not be decoded
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(0, "ParseError", message)
    }

    /// HTTP status code, 0 if none
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Short error kind
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Raw detail text
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the request failed before any response arrived
    pub fn is_transport_error(&self) -> bool {
        self.status == 0 && self.kind == "NetworkError"
    }

    /// Whether the backend rejected the credentials
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Error body shapes the backend returns
#[derive(Debug, Clone, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// =============================================================================
// Request Types
// =============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// DELETE request
    Delete,
}

impl HttpMethod {
    /// Method name
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A request against a backend path
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the base URL, starting with `/`
    pub path: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// JSON body
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Create a request with an arbitrary method
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), headers: HashMap::new(), body: None }
    }

    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Create a PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Create a DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Attach `Authorization: Bearer <token>`
    ///
    /// The token is sent verbatim, an empty token yields `"Bearer "`.
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    /// Set the request body from JSON
    pub fn json_body<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(value)?);
        Ok(self)
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// A decoded successful response
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response data
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Create a new response
    pub fn new(status: u16, headers: HashMap<String, String>, data: T) -> Self {
        Self { status, headers, data }
    }

    /// Get a header value
    pub fn header(&self, key: &str) -> Option<&String> {
        self.headers.get(key)
    }

    /// Check if the response is successful (2xx status)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Transform the payload, keeping status and headers
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse { status: self.status, headers: self.headers, data: f(self.data) }
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base service URL
    pub base_url: String,
    /// Request timeout, `None` to wait indefinitely
    pub timeout: Option<Duration>,
    /// User agent string
    pub user_agent: String,
    /// Custom headers to include in all requests
    pub default_headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            user_agent: format!("Classroom-Client/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }

    /// Set a timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// HTTP Client Implementation
// =============================================================================

use reqwest::{Client as ReqwestClient, Response as ReqwestResponse};

/// Low-level client for the backend
///
/// # Examples
/// ```
/// use classroom_api::http::{ApiClientConfig, ApiRequest, HttpClient};
///
/// async fn example() -> Result<(), Box<dyn std::error::Error>> {
///     let client = HttpClient::new(ApiClientConfig::default())?;
///     let response = client
///         .send::<serde_json::Value>(ApiRequest::get("/users/"))
///         .await?;
///     println!("{}", response.data);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    config: ApiClientConfig,
}

impl HttpClient {
    /// Create a new client
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        let mut builder = ReqwestClient::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Send a request and decode the JSON response
    pub async fn send<T>(&self, request: ApiRequest) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = self.url_for(&request.path);
        tracing::debug!(method = request.method.as_str(), %url, "sending request");

        let mut req = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.header("Content-Type", "application/json").body(body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ApiError::transport(format!("Request failed: {}", e)))?;

        self.parse_response(response).await
    }

    async fn parse_response<T>(&self, response: ReqwestResponse) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(key.to_string(), value_str.to_string());
            }
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let kind = status.canonical_reason().unwrap_or("Unknown");
            let parsed = serde_json::from_str::<ErrorBody>(&error_body).unwrap_or_default();
            let message = parsed
                .detail
                .or(parsed.message)
                .unwrap_or_else(|| format!("HTTP {}: {}", status.as_u16(), error_body));
            return Err(ApiError::new(status.as_u16(), kind, message));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::decode(format!("Failed to read response: {}", e)))?;

        // An empty body (e.g. 204) decodes as JSON null.
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };

        let data: T = serde_json::from_str(body)
            .map_err(|e| ApiError::decode(format!("Failed to parse JSON: {}", e)))?;

        Ok(ApiResponse::new(status.as_u16(), headers, data))
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Get the client configuration
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

// =============================================================================
// Tests
// =============================================================================
