//! HTTP client for the console REST API
//!
//! Every call returns `Result<Body, ApiError>`; non-success statuses come
//! back as [`HttpError`] for the caller to match on rather than being
//! dispatched to per-status handlers.

mod endpoints;
pub mod models;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

const JSON: &str = "application/json";
const OCTET_STREAM: &str = "application/octet-stream";

/// Non-success HTTP status, with the server's description when it sent one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    pub status: u16,
    pub message: Option<String>,
}

impl HttpError {
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self { status, message }
    }

    pub fn is_bad_request(&self) -> bool {
        self.status == StatusCode::BAD_REQUEST.as_u16()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED.as_u16()
    }

    pub fn is_forbidden(&self) -> bool {
        self.status == StatusCode::FORBIDDEN.as_u16()
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND.as_u16()
    }

    pub fn is_conflict(&self) -> bool {
        self.status == StatusCode::CONFLICT.as_u16()
    }

    pub fn is_internal_server_error(&self) -> bool {
        self.status == StatusCode::INTERNAL_SERVER_ERROR.as_u16()
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "status {}: {}", self.status, message),
            None => write!(f, "status {}", self.status),
        }
    }
}

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request rejected with {0}")]
    Status(HttpError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("expected {expected} response from {path}")]
    UnexpectedBody { expected: &'static str, path: String },
}

impl ApiError {
    /// The HTTP error when the server answered with a non-success status
    pub fn http(&self) -> Option<&HttpError> {
        match self {
            ApiError::Status(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.http().map(HttpError::is_unauthorized).unwrap_or(false)
    }

    pub fn is_not_found(&self) -> bool {
        self.http().map(HttpError::is_not_found).unwrap_or(false)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Serialization(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Serialization(e.to_string())
    }
}

/// Decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(serde_json::Value),
    Binary(Vec<u8>),
    /// The response carried no content type
    Empty,
}

/// Request authorization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Auth {
    #[default]
    None,
    Bearer(String),
    Basic { username: String, password: String },
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub auth: Auth,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authorize with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Auth::Bearer(token.into());
        self
    }

    /// Authorize with HTTP basic credentials
    pub fn with_basic(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Auth::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// JSON body, only sent with PUT and POST
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// Console API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request and decode the response by content type
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        opts: RequestOptions,
    ) -> Result<Body, ApiError> {
        let result = self.send(method.clone(), path, opts).await;
        if let Err(ref e) = result {
            match e {
                ApiError::Status(http) => {
                    tracing::warn!(
                        status = http.status,
                        %method,
                        path,
                        message = http.message.as_deref().unwrap_or(""),
                        "unhandled status"
                    );
                }
                other => {
                    tracing::warn!(%method, path, "request failed: {}", other);
                }
            }
        }
        result
    }

    async fn send(&self, method: Method, path: &str, opts: RequestOptions) -> Result<Body, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method.clone(), url);

        builder = match &opts.auth {
            Auth::Bearer(token) => builder.bearer_auth(token),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Auth::None => builder,
        };

        if method == Method::PUT || method == Method::POST {
            if let Some(ref body) = opts.body {
                builder = builder.json(body);
            }
        }

        tracing::debug!(%method, path, "sending request");
        let response = builder.send().await?;
        let content_type = media_type(&response);

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = match content_type.as_deref() {
                Some(JSON) => response
                    .json::<ErrorBody>()
                    .await
                    .ok()
                    .map(|e| {
                        format!(
                            "Error: {}, Description: {}",
                            e.error.unwrap_or_default(),
                            e.error_description.unwrap_or_default()
                        )
                    }),
                _ => None,
            };
            return Err(ApiError::Status(HttpError::new(status, message)));
        }

        match content_type.as_deref() {
            None => Ok(Body::Empty),
            Some(JSON) => Ok(Body::Json(response.json().await?)),
            Some(OCTET_STREAM) => Ok(Body::Binary(response.bytes().await?.to_vec())),
            Some(other) => Err(ApiError::UnsupportedContentType(other.to_string())),
        }
    }

    /// Request a JSON document and decode it into `T`
    pub(crate) async fn json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        opts: RequestOptions,
    ) -> Result<T, ApiError> {
        let result = match self.request(method.clone(), path, opts).await? {
            Body::Json(value) => serde_json::from_value(value).map_err(ApiError::from),
            _ => Err(ApiError::UnexpectedBody {
                expected: JSON,
                path: path.to_string(),
            }),
        };
        if let Err(ref e) = result {
            tracing::warn!(%method, path, "response decode failed: {}", e);
        }
        result
    }

    /// Request a binary payload
    pub(crate) async fn binary(
        &self,
        method: Method,
        path: &str,
        opts: RequestOptions,
    ) -> Result<Vec<u8>, ApiError> {
        match self.request(method.clone(), path, opts).await? {
            Body::Binary(bytes) => Ok(bytes),
            _ => {
                let e = ApiError::UnexpectedBody {
                    expected: OCTET_STREAM,
                    path: path.to_string(),
                };
                tracing::warn!(%method, path, "response decode failed: {}", e);
                Err(e)
            }
        }
    }

    /// Issue a request whose response body, if any, is ignored
    pub(crate) async fn ignore_body(
        &self,
        method: Method,
        path: &str,
        opts: RequestOptions,
    ) -> Result<(), ApiError> {
        self.request(method, path, opts).await.map(|_| ())
    }
}

/// Content type without parameters, e.g. `application/json; charset=utf-8`
/// becomes `application/json`
fn media_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_classification() {
        assert!(HttpError::new(400, None).is_bad_request());
        assert!(HttpError::new(401, None).is_unauthorized());
        assert!(HttpError::new(403, None).is_forbidden());
        assert!(HttpError::new(404, None).is_not_found());
        assert!(HttpError::new(409, None).is_conflict());
        assert!(HttpError::new(500, None).is_internal_server_error());
        assert!(!HttpError::new(502, None).is_internal_server_error());
    }

    #[test]
    fn test_api_error_unauthorized() {
        let err = ApiError::Status(HttpError::new(401, Some("expired".to_string())));
        assert!(err.is_unauthorized());
        assert!(!err.is_not_found());
        assert!(!ApiError::Transport("refused".to_string()).is_unauthorized());
    }

    #[test]
    fn test_request_options_builder() {
        let opts = RequestOptions::new()
            .with_basic("user", "pass")
            .with_body(serde_json::json!({"name": "x"}));
        assert_eq!(
            opts.auth,
            Auth::Basic {
                username: "user".to_string(),
                password: "pass".to_string()
            }
        );
        assert!(opts.body.is_some());

        let opts = opts.with_token("t");
        assert_eq!(opts.auth, Auth::Bearer("t".to_string()));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:6080/");
        assert_eq!(client.base_url(), "http://localhost:6080");
    }
}
