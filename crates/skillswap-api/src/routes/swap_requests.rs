//! # Swap Request API
//!
//! | Method | Path                                  | Who                |
//! |--------|---------------------------------------|--------------------|
//! | POST   | `/v1/swap-requests`                   | any principal      |
//! | GET    | `/v1/swap-requests?type=&status=`     | any principal      |
//! | GET    | `/v1/swap-requests/stats/summary`     | any principal      |
//! | GET    | `/v1/swap-requests/:id`               | either party       |
//! | PUT    | `/v1/swap-requests/:id/respond`       | provider           |
//! | PUT    | `/v1/swap-requests/:id/complete`      | either party       |
//! | DELETE | `/v1/swap-requests/:id`               | requester          |
//!
//! The caller is always the guard-resolved [`Principal`]; the requester of a
//! new request is never taken from the body.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use skillswap_core::{MeetingType, Note, Priority, SkillLabel, Timeline, UserId, ValidationError};
use skillswap_state::{NewSwapRequest, RespondAction, SwapStatus};
use utoipa::{IntoParams, ToSchema};

use crate::directory::Principal;
use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_query, extract_validated_json, parse_request_id, Validate};
use crate::repository::Scope;
use crate::routes::{
    ApiResponse, MessageResponse, SwapRequestList, SwapRequestListResponse, SwapRequestResponse,
    SwapRequestView, SwapSummaryResponse,
};
use crate::service::SwapSummary;
use crate::state::AppState;

// -- Request DTOs -------------------------------------------------------------

/// Body of `POST /v1/swap-requests`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CreateSwapRequestBody {
    /// Principal asked to provide the skill.
    pub provider_id: String,
    pub skill_requested: String,
    pub skill_category: String,
    /// Up to 500 characters.
    pub message: Option<String>,
    /// `low`, `medium` or `high`. Defaults to `medium`.
    pub priority: Option<String>,
    /// `online`, `in-person` or `either`. Defaults to `either`.
    pub preferred_meeting_type: Option<String>,
    /// `asap`, `this-week`, `this-month` or `flexible`. Defaults to `flexible`.
    pub timeline: Option<String>,
}

/// A create body with every field checked, still missing its requester.
#[derive(Debug)]
pub struct SwapRequestDraft {
    provider_id: UserId,
    skill_requested: SkillLabel,
    skill_category: SkillLabel,
    message: Note,
    priority: Priority,
    preferred_meeting_type: MeetingType,
    timeline: Timeline,
}

impl SwapRequestDraft {
    fn requested_by(self, requester_id: UserId) -> NewSwapRequest {
        NewSwapRequest {
            requester_id,
            provider_id: self.provider_id,
            skill_requested: self.skill_requested,
            skill_category: self.skill_category,
            message: self.message,
            priority: self.priority,
            preferred_meeting_type: self.preferred_meeting_type,
            timeline: self.timeline,
        }
    }
}

/// Parse an optional enum field, falling back to its default when absent.
fn parse_or_default<T>(value: Option<&str>) -> Result<T, ValidationError>
where
    T: Default + std::str::FromStr<Err = ValidationError>,
{
    value.map_or_else(|| Ok(T::default()), str::parse)
}

impl Validate for CreateSwapRequestBody {
    type Validated = SwapRequestDraft;

    fn validate(self) -> Result<SwapRequestDraft, ValidationError> {
        let provider = self.provider_id.trim();
        if provider.is_empty() {
            return Err(ValidationError::Blank {
                field: "providerId",
            });
        }
        Ok(SwapRequestDraft {
            provider_id: UserId::parse(provider)?,
            skill_requested: SkillLabel::new("skillRequested", &self.skill_requested)?,
            skill_category: SkillLabel::new("skillCategory", &self.skill_category)?,
            message: Note::from_optional("message", self.message.as_deref())?,
            priority: parse_or_default(self.priority.as_deref())?,
            preferred_meeting_type: parse_or_default(self.preferred_meeting_type.as_deref())?,
            timeline: parse_or_default(self.timeline.as_deref())?,
        })
    }
}

/// Body of `PUT /v1/swap-requests/:id/respond`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RespondBody {
    /// `accept` or `decline`.
    pub action: String,
    /// Up to 500 characters.
    pub response_message: Option<String>,
}

impl Validate for RespondBody {
    type Validated = (RespondAction, Note);

    fn validate(self) -> Result<(RespondAction, Note), ValidationError> {
        let action = self.action.trim();
        if action.is_empty() {
            return Err(ValidationError::Blank { field: "action" });
        }
        Ok((
            action.parse()?,
            Note::from_optional("responseMessage", self.response_message.as_deref())?,
        ))
    }
}

/// Query string of `GET /v1/swap-requests`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// `sent`, `received` or `all` (default).
    #[serde(rename = "type")]
    pub scope: Option<String>,
    /// Restrict to one status.
    pub status: Option<String>,
}

impl ListQuery {
    fn parse(self) -> Result<(Scope, Option<SwapStatus>), ValidationError> {
        let scope = match self.scope.as_deref().map(str::trim) {
            None | Some("") => Scope::default(),
            Some(s) => s.parse()?,
        };
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(s.parse()?),
        };
        Ok((scope, status))
    }
}

// -- Router -------------------------------------------------------------------

/// Build the swap request router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/swap-requests",
            get(list_swap_requests).post(create_swap_request),
        )
        .route("/v1/swap-requests/stats/summary", get(swap_summary))
        .route(
            "/v1/swap-requests/:id",
            get(get_swap_request).delete(cancel_swap_request),
        )
        .route("/v1/swap-requests/:id/respond", put(respond_to_swap_request))
        .route("/v1/swap-requests/:id/complete", put(complete_swap_request))
}

// -- Handlers -----------------------------------------------------------------

/// POST /v1/swap-requests: Send a swap request to another principal.
#[utoipa::path(
    post,
    path = "/v1/swap-requests",
    request_body = CreateSwapRequestBody,
    responses(
        (status = 201, description = "Request created", body = SwapRequestResponse),
        (status = 400, description = "Invalid fields or duplicate pending request", body = ErrorBody),
        (status = 401, description = "No valid credential", body = ErrorBody),
        (status = 404, description = "Provider not found", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "swap-requests"
)]
pub(crate) async fn create_swap_request(
    State(state): State<AppState>,
    caller: Principal,
    body: Result<Json<CreateSwapRequestBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SwapRequestView>>), AppError> {
    let draft = extract_validated_json(body)?;
    let created = state.swaps.create(draft.requested_by(caller.id)).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Swap request sent successfully",
            created.into(),
        )),
    ))
}

/// GET /v1/swap-requests: List the caller's requests, newest first.
#[utoipa::path(
    get,
    path = "/v1/swap-requests",
    params(ListQuery),
    responses(
        (status = 200, description = "Matching requests", body = SwapRequestListResponse),
        (status = 400, description = "Unknown type or status", body = ErrorBody),
        (status = 401, description = "No valid credential", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "swap-requests"
)]
pub(crate) async fn list_swap_requests(
    State(state): State<AppState>,
    caller: Principal,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<SwapRequestList>>, AppError> {
    let (scope, status) = extract_query(query)?.parse()?;
    let items = state.swaps.list_for_user(caller.id, scope, status).await?;
    Ok(Json(ApiResponse::new(
        "Swap requests retrieved successfully",
        items.into(),
    )))
}

/// GET /v1/swap-requests/stats/summary: Counts of the caller's requests.
///
/// Declined requests count towards `total` only.
#[utoipa::path(
    get,
    path = "/v1/swap-requests/stats/summary",
    responses(
        (status = 200, description = "Counts by role and status", body = SwapSummaryResponse),
        (status = 401, description = "No valid credential", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "swap-requests"
)]
pub(crate) async fn swap_summary(
    State(state): State<AppState>,
    caller: Principal,
) -> Result<Json<ApiResponse<SwapSummary>>, AppError> {
    let summary = state.swaps.summary(caller.id).await?;
    Ok(Json(ApiResponse::new(
        "Swap statistics retrieved successfully",
        summary,
    )))
}

/// GET /v1/swap-requests/:id: Read one request the caller takes part in.
#[utoipa::path(
    get,
    path = "/v1/swap-requests/{id}",
    params(("id" = String, Path, description = "Swap request ID")),
    responses(
        (status = 200, description = "The request", body = SwapRequestResponse),
        (status = 400, description = "Malformed ID", body = ErrorBody),
        (status = 403, description = "Caller is not a party", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "swap-requests"
)]
pub(crate) async fn get_swap_request(
    State(state): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SwapRequestView>>, AppError> {
    let id = parse_request_id(&id)?;
    let view = state.swaps.get(id, caller.id).await?;
    Ok(Json(ApiResponse::new(
        "Swap request retrieved successfully",
        view.into(),
    )))
}

/// PUT /v1/swap-requests/:id/respond: Provider accepts or declines.
#[utoipa::path(
    put,
    path = "/v1/swap-requests/{id}/respond",
    params(("id" = String, Path, description = "Swap request ID")),
    request_body = RespondBody,
    responses(
        (status = 200, description = "Request answered", body = SwapRequestResponse),
        (status = 400, description = "Bad action or request no longer pending", body = ErrorBody),
        (status = 403, description = "Caller is not the provider", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "swap-requests"
)]
pub(crate) async fn respond_to_swap_request(
    State(state): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    body: Result<Json<RespondBody>, JsonRejection>,
) -> Result<Json<ApiResponse<SwapRequestView>>, AppError> {
    let id = parse_request_id(&id)?;
    let (action, response_message) = extract_validated_json(body)?;
    let view = state
        .swaps
        .respond(id, caller.id, action, response_message)
        .await?;
    Ok(Json(ApiResponse::new(
        format!("Swap request {} successfully", action.past_tense()),
        view.into(),
    )))
}

/// PUT /v1/swap-requests/:id/complete: Either party closes an accepted request.
#[utoipa::path(
    put,
    path = "/v1/swap-requests/{id}/complete",
    params(("id" = String, Path, description = "Swap request ID")),
    responses(
        (status = 200, description = "Request completed", body = SwapRequestResponse),
        (status = 400, description = "Request is not accepted", body = ErrorBody),
        (status = 403, description = "Caller is not a party", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "swap-requests"
)]
pub(crate) async fn complete_swap_request(
    State(state): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SwapRequestView>>, AppError> {
    let id = parse_request_id(&id)?;
    let view = state.swaps.complete(id, caller.id).await?;
    Ok(Json(ApiResponse::new(
        "Swap request marked as completed",
        view.into(),
    )))
}

/// DELETE /v1/swap-requests/:id: Requester withdraws a pending request.
#[utoipa::path(
    delete,
    path = "/v1/swap-requests/{id}",
    params(("id" = String, Path, description = "Swap request ID")),
    responses(
        (status = 200, description = "Request cancelled", body = MessageResponse),
        (status = 400, description = "Request is not pending", body = ErrorBody),
        (status = 403, description = "Caller is not the requester", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "swap-requests"
)]
pub(crate) async fn cancel_swap_request(
    State(state): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_request_id(&id)?;
    state.swaps.cancel(id, caller.id).await?;
    Ok(Json(MessageResponse::new(
        "Swap request cancelled successfully",
    )))
}
