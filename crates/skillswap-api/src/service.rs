//! # Swap Service
//!
//! Runs the lifecycle rules from `skillswap-state` against the injected
//! repository and directory.
//!
//! Each mutation follows the same shape: read the record, ask the pure state
//! machine for the next value, then persist it with a conditional write keyed
//! on the status that was read. If another caller got there first the write
//! reports `Conflict` and the loser sees `InvalidTransition`; a record that
//! vanished in between reports `NotFound`. Nothing is retried.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use skillswap_core::{Note, SwapRequestId, UserId, ValidationError};
use skillswap_state::{
    NewSwapRequest, RespondAction, SwapRequest, SwapStatus, TransitionError,
};
use thiserror::Error;
use utoipa::ToSchema;

use crate::directory::{DirectoryError, PrincipalDirectory};
use crate::repository::{
    Conditional, RepositoryError, Scope, SwapFilter, SwapRequestRepository, SwapWithParties,
};

const NOT_FOUND: &str = "swap request not found";

/// Failure of a swap operation, already in the vocabulary of the API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("you already have a pending request for this skill with this provider")]
    DuplicatePending,

    #[error("{0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl From<RepositoryError> for SwapError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicatePending => Self::DuplicatePending,
            other => Self::Repository(other),
        }
    }
}

impl From<TransitionError> for SwapError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Forbidden(msg) => Self::Forbidden(msg.to_string()),
            TransitionError::InvalidTransition { .. } => Self::InvalidTransition(err.to_string()),
            TransitionError::SelfRequest => Self::Validation(err.to_string()),
        }
    }
}

impl From<ValidationError> for SwapError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Per-side request counts for the statistics endpoint.
///
/// Declined requests appear only in `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SideCounts {
    pub total: u64,
    pub pending: u64,
    pub accepted: u64,
    pub completed: u64,
}

/// Request counts for one user, split by role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SwapSummary {
    pub sent: SideCounts,
    pub received: SideCounts,
}

/// Orchestrates swap request operations.
#[derive(Clone)]
pub struct SwapService {
    repo: Arc<dyn SwapRequestRepository>,
    directory: Arc<dyn PrincipalDirectory>,
}

impl std::fmt::Debug for SwapService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapService").finish_non_exhaustive()
    }
}

impl SwapService {
    pub fn new(
        repo: Arc<dyn SwapRequestRepository>,
        directory: Arc<dyn PrincipalDirectory>,
    ) -> Self {
        Self { repo, directory }
    }

    /// Create a pending request from `input.requester_id` to `input.provider_id`.
    ///
    /// The duplicate lookup is only a fast path; the repository's uniqueness
    /// guarantee decides races.
    pub async fn create(&self, input: NewSwapRequest) -> Result<SwapWithParties, SwapError> {
        if self.directory.find_by_id(input.provider_id).await?.is_none() {
            return Err(SwapError::NotFound("provider not found".to_string()));
        }
        let record = SwapRequest::new_pending(input, Utc::now())?;

        if self
            .repo
            .find_pending(
                record.requester_id,
                record.provider_id,
                &record.skill_requested,
            )
            .await?
            .is_some()
        {
            return Err(SwapError::DuplicatePending);
        }

        let stored = self.repo.insert(record).await?;
        tracing::info!(
            swap_request_id = %stored.id,
            requester_id = %stored.requester_id,
            provider_id = %stored.provider_id,
            "swap request created"
        );
        self.with_parties(stored).await
    }

    /// Fetch one request the caller takes part in.
    pub async fn get(
        &self,
        id: SwapRequestId,
        caller: UserId,
    ) -> Result<SwapWithParties, SwapError> {
        let view = self
            .repo
            .find_with_parties(id, self.directory.as_ref())
            .await?
            .ok_or_else(|| SwapError::NotFound(NOT_FOUND.to_string()))?;
        view.request.ensure_party(caller)?;
        Ok(view)
    }

    /// The provider accepts or declines a pending request.
    pub async fn respond(
        &self,
        id: SwapRequestId,
        caller: UserId,
        action: RespondAction,
        response_message: Note,
    ) -> Result<SwapWithParties, SwapError> {
        let current = self.load(id).await?;
        let next = current.respond(caller, action, response_message, Utc::now())?;
        let stored = self
            .commit(id, current.status, next, action.as_str())
            .await?;
        tracing::info!(swap_request_id = %id, status = %stored.status, "swap request answered");
        self.with_parties(stored).await
    }

    /// Either party marks an accepted request as completed.
    pub async fn complete(
        &self,
        id: SwapRequestId,
        caller: UserId,
    ) -> Result<SwapWithParties, SwapError> {
        let current = self.load(id).await?;
        let next = current.complete(caller, Utc::now())?;
        let stored = self.commit(id, current.status, next, "complete").await?;
        tracing::info!(swap_request_id = %id, "swap request completed");
        self.with_parties(stored).await
    }

    /// The requester withdraws a pending request.
    pub async fn cancel(&self, id: SwapRequestId, caller: UserId) -> Result<(), SwapError> {
        let current = self.load(id).await?;
        current.ensure_cancellable(caller)?;
        match self.repo.delete_if_status(id, current.status).await? {
            Conditional::Applied(()) => {
                tracing::info!(swap_request_id = %id, "swap request cancelled");
                Ok(())
            }
            Conditional::NotFound => Err(SwapError::NotFound(NOT_FOUND.to_string())),
            Conditional::Conflict(now) => Err(lost_race("cancel", now)),
        }
    }

    /// Requests involving `user`, newest first.
    pub async fn list_for_user(
        &self,
        user: UserId,
        scope: Scope,
        status: Option<SwapStatus>,
    ) -> Result<Vec<SwapWithParties>, SwapError> {
        let filter = SwapFilter::involving(user).scope(scope).status(status);
        let records = self.repo.find_many(&filter).await?;

        let mut ids: Vec<UserId> = records
            .iter()
            .flat_map(|r| [r.requester_id, r.provider_id])
            .collect();
        ids.sort();
        ids.dedup();
        let summaries = self.directory.summaries(&ids).await?;

        Ok(records
            .into_iter()
            .map(|r| SwapWithParties::from_map(r, &summaries))
            .collect())
    }

    /// Counts of the user's requests by role and status.
    pub async fn summary(&self, user: UserId) -> Result<SwapSummary, SwapError> {
        Ok(SwapSummary {
            sent: self.side_counts(user, Scope::Sent).await?,
            received: self.side_counts(user, Scope::Received).await?,
        })
    }

    async fn side_counts(&self, user: UserId, scope: Scope) -> Result<SideCounts, SwapError> {
        let base = SwapFilter::involving(user).scope(scope);
        Ok(SideCounts {
            total: self.repo.count(&base).await?,
            pending: self
                .repo
                .count(&base.status(Some(SwapStatus::Pending)))
                .await?,
            accepted: self
                .repo
                .count(&base.status(Some(SwapStatus::Accepted)))
                .await?,
            completed: self
                .repo
                .count(&base.status(Some(SwapStatus::Completed)))
                .await?,
        })
    }

    async fn load(&self, id: SwapRequestId) -> Result<SwapRequest, SwapError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| SwapError::NotFound(NOT_FOUND.to_string()))
    }

    async fn commit(
        &self,
        id: SwapRequestId,
        expected: SwapStatus,
        next: SwapRequest,
        action: &'static str,
    ) -> Result<SwapRequest, SwapError> {
        match self.repo.compare_and_swap_status(id, expected, next).await? {
            Conditional::Applied(stored) => Ok(stored),
            Conditional::NotFound => Err(SwapError::NotFound(NOT_FOUND.to_string())),
            Conditional::Conflict(now) => Err(lost_race(action, now)),
        }
    }

    async fn with_parties(&self, request: SwapRequest) -> Result<SwapWithParties, SwapError> {
        let summaries = self
            .directory
            .summaries(&[request.requester_id, request.provider_id])
            .await?;
        Ok(SwapWithParties::from_map(request, &summaries))
    }
}

fn lost_race(action: &str, now: SwapStatus) -> SwapError {
    tracing::warn!(action, status = %now, "conditional write lost to a concurrent update");
    SwapError::InvalidTransition(format!(
        "request was modified concurrently (cannot {action} while {now})"
    ))
}
