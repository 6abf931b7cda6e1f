use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// ErrorBody
///
/// The uniform JSON error envelope: `{ "error": "..." }`.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// ApiError
///
/// The handler-level error type. Each variant maps to exactly one status
/// code, so handlers express failures by intent rather than by status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 400: the request was well-formed JSON but semantically invalid.
    Validation(String),
    /// 401: missing, unknown or revoked API key.
    Unauthorized,
    /// 403: authenticated, but the role or tier does not allow this.
    Forbidden(String),
    /// 404: absent record — or a record owned by someone else, which is
    /// deliberately indistinguishable.
    NotFound,
    /// 409: the record exists in a state that conflicts with the request.
    Conflict(String),
    /// 429: the key's fixed-window quota is exhausted.
    RateLimited,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Validation(m) | ApiError::Forbidden(m) | ApiError::Conflict(m) => m,
            ApiError::Unauthorized => "invalid or missing API key".to_string(),
            ApiError::NotFound => "not found".to_string(),
            ApiError::RateLimited => "rate limit exceeded".to_string(),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
