//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps errors from the core, crypto, state and service layers to HTTP
//! status codes and the JSON error envelope:
//!
//! ```json
//! {"status": "error", "error": {"code": "NOT_FOUND", "message": "..."}}
//! ```
//!
//! Internal error details are logged and never returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use skillswap_core::ValidationError;
use skillswap_crypto::TokenError;
use thiserror::Error;
use utoipa::ToSchema;

use crate::directory::DirectoryError;
use crate::service::SwapError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Always `"error"`.
    pub status: String,
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "TOKEN_EXPIRED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// A field failed a business rule (400).
    #[error("{0}")]
    Validation(String),

    /// Request body, query or path could not be parsed (400).
    #[error("{0}")]
    BadRequest(String),

    /// No usable credential, or the principal no longer exists (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Credential was genuine but has expired (401).
    #[error("{0}")]
    TokenExpired(String),

    /// Credential is malformed or its signature does not match (401).
    #[error("{0}")]
    TokenInvalid(String),

    /// Caller lacks the role this action requires (403).
    #[error("{0}")]
    Forbidden(String),

    /// Principal exists but has been deactivated (403).
    #[error("{0}")]
    AccountDeactivated(String),

    /// A pending request already exists for the same triple (400).
    #[error("{0}")]
    DuplicatePending(String),

    /// The record's status does not allow the requested step (400).
    #[error("{0}")]
    InvalidTransition(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::TokenExpired(_) => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            Self::TokenInvalid(_) => (StatusCode::UNAUTHORIZED, "TOKEN_INVALID"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::AccountDeactivated(_) => (StatusCode::FORBIDDEN, "ACCOUNT_DEACTIVATED"),
            Self::DuplicatePending(_) => (StatusCode::BAD_REQUEST, "DUPLICATE_PENDING"),
            Self::InvalidTransition(_) => (StatusCode::BAD_REQUEST, "INVALID_TRANSITION"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            status: "error".to_string(),
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Verification outcomes keep their distinct codes; configuration and
/// issuance failures are server faults.
impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired { .. } => Self::TokenExpired("token has expired".to_string()),
            TokenError::Malformed(_) => Self::TokenInvalid("invalid token".to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<SwapError> for AppError {
    fn from(err: SwapError) -> Self {
        match err {
            SwapError::Validation(msg) => Self::Validation(msg),
            SwapError::NotFound(msg) => Self::NotFound(msg),
            SwapError::Forbidden(msg) => Self::Forbidden(msg),
            SwapError::DuplicatePending => Self::DuplicatePending(err.to_string()),
            SwapError::InvalidTransition(msg) => Self::InvalidTransition(msg),
            SwapError::Repository(_) | SwapError::Directory(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryError;
    use http_body_util::BodyExt;
    use skillswap_core::Timestamp;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), 404, "NOT_FOUND"),
            (AppError::Validation("x".into()), 400, "VALIDATION_ERROR"),
            (AppError::BadRequest("x".into()), 400, "BAD_REQUEST"),
            (AppError::Unauthorized("x".into()), 401, "UNAUTHORIZED"),
            (AppError::TokenExpired("x".into()), 401, "TOKEN_EXPIRED"),
            (AppError::TokenInvalid("x".into()), 401, "TOKEN_INVALID"),
            (AppError::Forbidden("x".into()), 403, "FORBIDDEN"),
            (AppError::AccountDeactivated("x".into()), 403, "ACCOUNT_DEACTIVATED"),
            (AppError::DuplicatePending("x".into()), 400, "DUPLICATE_PENDING"),
            (AppError::InvalidTransition("x".into()), 400, "INVALID_TRANSITION"),
            (AppError::Internal("x".into()), 500, "INTERNAL_ERROR"),
        ];
        for (err, status, code) in cases {
            let (s, c) = err.status_and_code();
            assert_eq!(s.as_u16(), status, "{err:?}");
            assert_eq!(c, code);
        }
    }

    #[tokio::test]
    async fn into_response_uses_error_envelope() {
        let (status, body) = response_parts(AppError::NotFound("swap request not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.status, "error");
        assert_eq!(body.error.code, "NOT_FOUND");
        assert_eq!(body.error.message, "swap request not found");
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        let (status, body) =
            response_parts(AppError::Internal("db connection failed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(
            !body.error.message.contains("db connection"),
            "internal error details must not leak: {}",
            body.error.message
        );
        assert_eq!(body.error.message, "An internal error occurred");
    }

    #[test]
    fn token_errors_keep_distinct_codes() {
        let expired = AppError::from(TokenError::Expired {
            expired_at: Timestamp::from_unix_secs(0).unwrap(),
        });
        assert_eq!(expired.status_and_code().1, "TOKEN_EXPIRED");

        let malformed = AppError::from(TokenError::Malformed("bad".into()));
        assert_eq!(malformed.status_and_code().1, "TOKEN_INVALID");

        let key = AppError::from(TokenError::InvalidKey("short".into()));
        assert_eq!(key.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn swap_errors_map_to_taxonomy() {
        assert_eq!(
            AppError::from(SwapError::DuplicatePending).status_and_code(),
            (StatusCode::BAD_REQUEST, "DUPLICATE_PENDING")
        );
        assert_eq!(
            AppError::from(SwapError::InvalidTransition("x".into())).status_and_code(),
            (StatusCode::BAD_REQUEST, "INVALID_TRANSITION")
        );
        assert_eq!(
            AppError::from(SwapError::Forbidden("x".into())).status_and_code(),
            (StatusCode::FORBIDDEN, "FORBIDDEN")
        );
    }

    #[test]
    fn storage_failures_never_become_business_codes() {
        let err = AppError::from(SwapError::Repository(RepositoryError::Unavailable(
            "connection refused".into(),
        )));
        assert_eq!(err.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::from(SwapError::Directory(DirectoryError::Unavailable(
            "timeout".into(),
        )));
        assert_eq!(err.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_error_from_core() {
        let err = AppError::from(ValidationError::Blank {
            field: "skillRequested",
        });
        match &err {
            AppError::Validation(msg) => assert!(msg.contains("skillRequested"), "got: {msg}"),
            other => panic!("expected Validation, got: {other:?}"),
        }
    }
}
