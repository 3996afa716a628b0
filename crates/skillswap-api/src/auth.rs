//! # Identity Guard
//!
//! Resolves the `Authorization: Bearer <token>` header into a [`Principal`]
//! before any protected handler runs.
//!
//! ## Rejection order
//!
//! 1. No header, a non-Bearer scheme or an empty token: 401 `UNAUTHORIZED`.
//! 2. Token fails verification: 401 `TOKEN_EXPIRED` or `TOKEN_INVALID`.
//! 3. Token names a principal the directory no longer knows: 401 `UNAUTHORIZED`.
//! 4. Principal is deactivated: 403 `ACCOUNT_DEACTIVATED`.
//!
//! A directory failure is a 500, never a 401 or 403. Rejections are logged
//! at `warn` with the reason. The token itself is never logged.

use axum::extract::{Request, State};
use axum::http::header;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::directory::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// Return the bearer token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively. Anything else, including an
/// empty token, counts as no credential.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Middleware resolving the caller before protected routes.
///
/// Install with `axum::middleware::from_fn_with_state`.
pub async fn identity_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match resolve(&state, header_value).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

async fn resolve(state: &AppState, header_value: Option<&str>) -> Result<Principal, AppError> {
    let Some(token) = header_value.and_then(bearer_token) else {
        tracing::warn!(
            header_present = header_value.is_some(),
            "authentication failed: no bearer credential"
        );
        return Err(AppError::Unauthorized("no credential supplied".into()));
    };

    let user_id = state.tokens.verify(token).map_err(|err| {
        tracing::warn!(reason = %err, "authentication failed: token rejected");
        AppError::from(err)
    })?;

    let principal = state
        .directory
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(user_id = %user_id, "authentication failed: principal no longer exists");
            AppError::Unauthorized("stale credential: principal no longer exists".into())
        })?;

    if !principal.active {
        tracing::warn!(user_id = %user_id, "authentication refused: account deactivated");
        return Err(AppError::AccountDeactivated("account deactivated".into()));
    }

    Ok(principal)
}

/// Extracts the principal the guard attached to the request.
///
/// Returns 401 if the guard did not run on this route.
#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no credential supplied".into()))
    }
}
