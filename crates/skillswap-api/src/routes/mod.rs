//! # API Route Modules
//!
//! - `swap_requests`: create, list, read, respond, complete, cancel and
//!   per-user statistics for swap requests.
//! - `auth`: the caller's own principal and token refresh.
//!
//! Every success body uses the same envelope:
//!
//! ```json
//! {"status": "success", "message": "...", "data": {...}}
//! ```

pub mod auth;
pub mod swap_requests;

use chrono::{DateTime, Utc};
use serde::Serialize;
use skillswap_core::{MeetingType, Priority, Timeline};
use skillswap_state::SwapStatus;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::directory::{Principal, PrincipalSummary};
use crate::repository::SwapWithParties;
use crate::service::SwapSummary;

/// Success envelope wrapping every handler result.
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    SwapRequestResponse = ApiResponse<SwapRequestView>,
    SwapRequestListResponse = ApiResponse<SwapRequestList>,
    SwapSummaryResponse = ApiResponse<SwapSummary>,
    PrincipalResponse = ApiResponse<PrincipalView>,
    TokenResponse = ApiResponse<TokenView>,
)]
pub struct ApiResponse<T> {
    /// Always `"success"`.
    #[schema(value_type = String, example = "success")]
    pub status: &'static str,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data,
        }
    }
}

/// Success envelope for operations with nothing to return.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Always `"success"`.
    #[schema(value_type = String, example = "success")]
    pub status: &'static str,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }
}

/// A swap request as returned to its parties.
///
/// `requester` and `provider` are `null` when the directory no longer knows
/// that principal; the ids are always present.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequestView {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub provider_id: Uuid,
    pub requester: Option<PrincipalSummary>,
    pub provider: Option<PrincipalSummary>,
    pub skill_requested: String,
    pub skill_category: String,
    pub message: String,
    pub response_message: String,
    #[schema(value_type = String, example = "pending")]
    pub status: SwapStatus,
    #[schema(value_type = String, example = "medium")]
    pub priority: Priority,
    #[schema(value_type = String, example = "either")]
    pub preferred_meeting_type: MeetingType,
    #[schema(value_type = String, example = "flexible")]
    pub timeline: Timeline,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SwapWithParties> for SwapRequestView {
    fn from(view: SwapWithParties) -> Self {
        let r = view.request;
        Self {
            id: *r.id.as_uuid(),
            requester_id: *r.requester_id.as_uuid(),
            provider_id: *r.provider_id.as_uuid(),
            requester: view.requester,
            provider: view.provider,
            skill_requested: r.skill_requested.as_str().to_string(),
            skill_category: r.skill_category.as_str().to_string(),
            message: r.message.as_str().to_string(),
            response_message: r.response_message.as_str().to_string(),
            status: r.status,
            priority: r.priority,
            preferred_meeting_type: r.preferred_meeting_type,
            timeline: r.timeline,
            responded_at: r.responded_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// A filtered list of swap requests, newest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct SwapRequestList {
    pub count: usize,
    pub requests: Vec<SwapRequestView>,
}

impl From<Vec<SwapWithParties>> for SwapRequestList {
    fn from(items: Vec<SwapWithParties>) -> Self {
        let requests: Vec<SwapRequestView> = items.into_iter().map(Into::into).collect();
        Self {
            count: requests.len(),
            requests,
        }
    }
}

/// The authenticated caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct PrincipalView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&Principal> for PrincipalView {
    fn from(p: &Principal) -> Self {
        Self {
            id: *p.id.as_uuid(),
            name: p.name.clone(),
            email: p.email.clone(),
        }
    }
}

/// A freshly issued bearer token.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenView {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
