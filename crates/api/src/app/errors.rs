use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use taskdesk_auth::{PasswordError, TokenError};
use taskdesk_core::{DomainError, ValidationErrors};
use taskdesk_infra::StoreError;

/// Everything a handler can fail with, collapsed into one place so every
/// route maps errors the same way.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

pub fn error_to_response(err: ApiError) -> axum::response::Response {
    match err {
        ApiError::Domain(DomainError::Validation(errors)) => validation_response(&errors),
        ApiError::Domain(DomainError::InvalidId(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", msg)
        }
        ApiError::Domain(DomainError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "not found")
        }
        ApiError::Domain(DomainError::Forbidden(msg)) => {
            json_error(StatusCode::FORBIDDEN, "forbidden", msg)
        }
        ApiError::Domain(DomainError::Conflict(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        ApiError::Unauthorized(msg) => json_error(StatusCode::UNAUTHORIZED, "unauthorized", msg),
        ApiError::Store(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            e.to_string(),
        ),
        ApiError::Password(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "hash_error",
            e.to_string(),
        ),
        ApiError::Token(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "token_error",
            e.to_string(),
        ),
    }
}

pub fn validation_response(errors: &ValidationErrors) -> axum::response::Response {
    let fields = errors
        .fields()
        .iter()
        .map(|f| json!({ "field": f.field, "message": f.message }))
        .collect::<Vec<_>>();

    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "message": errors.to_string(),
            "fields": fields,
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
