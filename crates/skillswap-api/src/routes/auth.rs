//! # Session API
//!
//! Routes about the caller's own credential. Logging in is handled by the
//! identity service that owns passwords; this API only reads and renews the
//! token it was handed.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::directory::Principal;
use crate::error::{AppError, ErrorBody};
use crate::routes::{ApiResponse, PrincipalResponse, PrincipalView, TokenResponse, TokenView};
use crate::state::AppState;

/// Build the session router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/me", get(current_principal))
        .route("/v1/auth/refresh", post(refresh_token))
}

/// GET /v1/auth/me: The principal behind the presented token.
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    responses(
        (status = 200, description = "Current principal", body = PrincipalResponse),
        (status = 401, description = "No valid credential", body = ErrorBody),
        (status = 403, description = "Account deactivated", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub(crate) async fn current_principal(caller: Principal) -> Json<ApiResponse<PrincipalView>> {
    Json(ApiResponse::new(
        "Principal retrieved successfully",
        PrincipalView::from(&caller),
    ))
}

/// POST /v1/auth/refresh: Exchange a valid token for a fresh one.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    responses(
        (status = 200, description = "Fresh token", body = TokenResponse),
        (status = 401, description = "No valid credential", body = ErrorBody),
        (status = 403, description = "Account deactivated", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub(crate) async fn refresh_token(
    State(state): State<AppState>,
    caller: Principal,
) -> Result<Json<ApiResponse<TokenView>>, AppError> {
    let issued = state.tokens.issue(caller.id)?;
    tracing::info!(user_id = %caller.id, expires_at = %issued.expires_at, "token refreshed");
    Ok(Json(ApiResponse::new(
        "Token refreshed successfully",
        TokenView {
            token: issued.token,
            expires_at: *issued.expires_at.as_datetime(),
        },
    )))
}
