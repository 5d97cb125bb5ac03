/// Error handling for the API server
///
/// Handlers return `Result<T, ApiError>`; errors render as
///
/// ```json
/// { "message": "Not Authorized! Invalid token.", "stack": "Unauthorized(...)" }
/// ```
///
/// The rendered response also carries an [`ErrorReport`] extension so
/// [`crate::middleware::error::hide_error_stack`] can blank `stack` in
/// production.
///
/// # Example
///
/// ```
/// use authstack_api::error::{ApiError, ApiResult};
///
/// fn find(id: u32) -> ApiResult<&'static str> {
///     match id {
///         1 => Ok("found"),
///         _ => Err(ApiError::NotFound("Resource not found!".to_string())),
///     }
/// }
/// ```

use authstack_shared::{
    auth::{jwt::JwtError, middleware::AuthError, password::PasswordError},
    store::StoreError,
};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message used for malformed identifiers
pub const RESOURCE_NOT_FOUND: &str = "Resource not found!";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400): validation failures, duplicate email
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Internal server error (500), message passed through
    InternalError(String),
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,

    /// Debug detail, `null` in production
    pub stack: Option<String>,
}

/// Response extension describing the error that produced a response
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalError(msg) => msg,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            message: self.message().to_string(),
            stack: Some(format!("{:?}", self)),
        };
        let report = ErrorReport {
            message: body.message.clone(),
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Store errors: duplicate email is the client's problem, a malformed id
/// reads as a missing resource, anything else is ours.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::BadRequest("User already exists".to_string()),
            StoreError::MalformedId(_) => ApiError::NotFound(RESOURCE_NOT_FOUND.to_string()),
            StoreError::Backend(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::Store(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Only reached when issuing tokens; verification failures go through [`AuthError`]
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field))
                })
            })
            .collect();
        messages.sort();

        ApiError::BadRequest(messages.join(", "))
    }
}

/// Unreadable bodies: bad JSON, wrong content type, oversized payloads
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::InternalError(format!("Background task failed: {}", err))
    }
}
