use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// Machine-readable error taxonomy. Each kind maps to exactly one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    AuthRequired,
    InvalidToken,
    InvalidCredentials,
    Forbidden,
    NotFound,
    /// Duplicate account or profile. Reported as 400, like any other validation failure.
    Conflict,
    Upstream,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::AuthRequired | ErrorKind::InvalidToken | ErrorKind::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The error half of the response envelope.
///
/// Serialized as `{"status", "code", "message", "detail"}`. For upstream
/// failures the cause is kept for logging and never written to the body.
#[derive(Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    pub detail: String,
    cause: Option<anyhow::Error>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(
        kind: ErrorKind,
        code: impl Into<String>,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            detail: detail.into(),
            cause: None,
        }
    }

    pub fn validation(code: &str, message: &str, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, code, message, detail)
    }

    pub fn conflict(code: &str, message: &str, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, code, message, detail)
    }

    pub fn forbidden(code: &str, message: &str, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, code, message, detail)
    }

    pub fn not_found(code: &str, message: &str, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, code, message, detail)
    }

    pub fn upstream(code: &str, message: &str, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            kind: ErrorKind::Upstream,
            code: code.into(),
            message: message.into(),
            detail: "internal error".into(),
            cause: Some(cause.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.message, self.code, self.detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.cause {
            Some(cause) => error!(
                status = status.as_u16(),
                code = %self.code,
                error = ?cause,
                "request failed"
            ),
            None => warn!(
                status = status.as_u16(),
                code = %self.code,
                detail = %self.detail,
                "request rejected"
            ),
        }

        let body = json!({
            "status": status.as_u16(),
            "code": self.code,
            "message": self.message,
            "detail": self.detail,
        });
        (status, Json(body)).into_response()
    }
}
