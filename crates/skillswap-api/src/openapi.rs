//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served unauthenticated at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SkillSwap Negotiation API",
        version = "0.1.0",
        description = "Identity guard and swap request lifecycle for peer-to-peer skill exchange.",
        license(name = "BUSL-1.1")
    ),
    paths(
        crate::routes::swap_requests::create_swap_request,
        crate::routes::swap_requests::list_swap_requests,
        crate::routes::swap_requests::swap_summary,
        crate::routes::swap_requests::get_swap_request,
        crate::routes::swap_requests::respond_to_swap_request,
        crate::routes::swap_requests::complete_swap_request,
        crate::routes::swap_requests::cancel_swap_request,
        crate::routes::auth::current_principal,
        crate::routes::auth::refresh_token,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::directory::PrincipalSummary,
        crate::service::SwapSummary,
        crate::service::SideCounts,
        crate::routes::SwapRequestView,
        crate::routes::SwapRequestList,
        crate::routes::PrincipalView,
        crate::routes::TokenView,
        crate::routes::MessageResponse,
        crate::routes::SwapRequestResponse,
        crate::routes::SwapRequestListResponse,
        crate::routes::SwapSummaryResponse,
        crate::routes::PrincipalResponse,
        crate::routes::TokenResponse,
        crate::routes::swap_requests::CreateSwapRequestBody,
        crate::routes::swap_requests::RespondBody,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "swap-requests", description = "Swap request negotiation"),
        (name = "auth", description = "Current principal and token refresh"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
