use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::LengthLimitError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::error::Category;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;

/// Upper bound on any JSON request body.
pub const MAX_BODY_BYTES: usize = 1_048_576;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("body must not be empty")]
    Empty,
    #[error("body must not be larger than {0} bytes")]
    TooLarge(usize),
    #[error("body contains badly-formed JSON (at line {line}, column {column})")]
    Syntax { line: usize, column: usize },
    #[error("body contains badly-formed JSON")]
    UnexpectedEof,
    #[error("body contains incorrect JSON type (at line {line}, column {column})")]
    IncorrectType { line: usize, column: usize },
    #[error("body contains unknown key \"{0}\"")]
    UnknownKey(String),
    #[error("body must only contain a single JSON value")]
    TrailingData,
    #[error("body is invalid: {0}")]
    Invalid(String),
}

impl DecodeError {
    fn from_serde(err: serde_json::Error) -> Self {
        let (line, column) = (err.line(), err.column());
        match err.classify() {
            Category::Syntax => DecodeError::Syntax { line, column },
            Category::Eof => DecodeError::UnexpectedEof,
            Category::Data => {
                let msg = err.to_string();
                if let Some(rest) = msg.strip_prefix("unknown field `") {
                    let name = rest.split('`').next().unwrap_or_default();
                    DecodeError::UnknownKey(name.to_string())
                } else if msg.starts_with("invalid type") || msg.starts_with("invalid value") {
                    DecodeError::IncorrectType { line, column }
                } else {
                    // serde_json appends " at line N column M"; the position is noise here
                    let trimmed = msg.split(" at line ").next().unwrap_or(&msg);
                    DecodeError::Invalid(trimmed.to_string())
                }
            }
            Category::Io => DecodeError::Invalid(err.to_string()),
        }
    }
}

/// Decodes exactly one JSON value of type `T` from `bytes`.
///
/// Unknown keys are rejected through `#[serde(deny_unknown_fields)]` on the
/// target type; anything after the first value is rejected here.
pub fn decode_strict<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    if bytes.len() > MAX_BODY_BYTES {
        return Err(DecodeError::TooLarge(MAX_BODY_BYTES));
    }
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = T::deserialize(&mut de).map_err(DecodeError::from_serde)?;
    de.end().map_err(|_| DecodeError::TrailingData)?;
    Ok(value)
}

/// JSON body extractor that applies [`decode_strict`] and the body ceiling,
/// rejecting through the error envelope instead of axum's plain-text rejections.
pub struct StrictJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for StrictJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|e| {
                if e.into_inner().is::<LengthLimitError>() {
                    reject(DecodeError::TooLarge(MAX_BODY_BYTES))
                } else {
                    reject(DecodeError::UnexpectedEof)
                }
            })?;

        decode_strict(&bytes).map(StrictJson).map_err(reject)
    }
}

fn reject(err: DecodeError) -> ApiError {
    ApiError::validation("request.decode_body", "failed to decode request body", err.to_string())
}

/// Success half of the envelope.
pub fn respond<T: Serialize>(status: StatusCode, payload: T) -> Response {
    (status, Json(payload)).into_response()
}

/// Runs the field rules of a decoded payload; failures are `{scope}.validate`.
pub fn validate_payload<T: Validate>(scope: &str, payload: &T) -> Result<(), ApiError> {
    payload.validate().map_err(|errors| {
        ApiError::validation(
            &format!("{scope}.validate"),
            "invalid request body",
            errors.to_string(),
        )
    })
}

/// Parses a path segment as an id, rejecting through the envelope.
pub fn parse_id(scope: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::validation(
            &format!("{scope}.parse_id"),
            "invalid id",
            format!("{raw:?} is not a valid id"),
        )
    })
}
