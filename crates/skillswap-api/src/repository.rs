//! # Swap Request Repository
//!
//! Storage contract for swap requests plus the in-memory adapter.
//!
//! The repository applies no business rules. It offers two storage
//! guarantees the service relies on:
//!
//! - **Pending uniqueness.** At most one `pending` record per
//!   `(requester, provider, skill)` triple. A violating insert fails with
//!   [`RepositoryError::DuplicatePending`].
//! - **Conditional writes.** [`SwapRequestRepository::compare_and_swap_status`]
//!   and [`SwapRequestRepository::delete_if_status`] apply only if the stored
//!   status still equals the one the caller observed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use skillswap_core::{SkillLabel, SwapRequestId, UserId, ValidationError};
use skillswap_state::{SwapRequest, SwapStatus};
use thiserror::Error;

use crate::directory::{PrincipalDirectory, PrincipalSummary};

// ─── Errors and outcomes ─────────────────────────────────────────────

/// Storage failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A pending request for the same triple already exists.
    #[error("a pending request already exists for this skill with this provider")]
    DuplicatePending,

    /// The backing store could not be reached or rejected the query.
    #[error("repository unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded into a record.
    #[error("corrupt swap request record: {0}")]
    Corrupt(String),
}

/// Outcome of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conditional<T> {
    /// Precondition held and the write was applied.
    Applied(T),
    /// No record with that id.
    NotFound,
    /// The record exists but its status is no longer the expected one.
    Conflict(SwapStatus),
}

// ─── Filters ─────────────────────────────────────────────────────────

/// Which side of a request the listing user is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Requests the user created.
    Sent,
    /// Requests addressed to the user.
    Received,
    /// Both.
    #[default]
    All,
}

impl Scope {
    /// The query-string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Received => "received",
            Self::All => "all",
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(Self::Sent),
            "received" => Ok(Self::Received),
            "all" => Ok(Self::All),
            other => Err(ValidationError::UnknownVariant {
                field: "type",
                value: other.to_string(),
                expected: "sent, received, all",
            }),
        }
    }
}

/// Selection of requests involving one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapFilter {
    pub user: UserId,
    pub scope: Scope,
    pub status: Option<SwapStatus>,
}

impl SwapFilter {
    /// Every request the user takes part in.
    pub fn involving(user: UserId) -> Self {
        Self {
            user,
            scope: Scope::All,
            status: None,
        }
    }

    /// Narrow to one side.
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Narrow to one status.
    pub fn status(mut self, status: Option<SwapStatus>) -> Self {
        self.status = status;
        self
    }

    /// Whether `record` is selected.
    pub fn matches(&self, record: &SwapRequest) -> bool {
        let side = match self.scope {
            Scope::Sent => record.requester_id == self.user,
            Scope::Received => record.provider_id == self.user,
            Scope::All => record.requester_id == self.user || record.provider_id == self.user,
        };
        side && self.status.map_or(true, |s| record.status == s)
    }
}

/// A record together with its parties' public summaries.
///
/// A summary is `None` when the directory no longer knows that principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapWithParties {
    pub request: SwapRequest,
    pub requester: Option<PrincipalSummary>,
    pub provider: Option<PrincipalSummary>,
}

impl SwapWithParties {
    /// Attach summaries from a lookup map.
    pub fn from_map(
        request: SwapRequest,
        summaries: &HashMap<UserId, PrincipalSummary>,
    ) -> Self {
        Self {
            requester: summaries.get(&request.requester_id).cloned(),
            provider: summaries.get(&request.provider_id).cloned(),
            request,
        }
    }
}

// ─── Contract ────────────────────────────────────────────────────────

/// Persistence port for swap requests.
#[async_trait]
pub trait SwapRequestRepository: Send + Sync {
    /// Store a new record.
    ///
    /// Fails with [`RepositoryError::DuplicatePending`] if `record` is pending
    /// and another pending record shares its triple.
    async fn insert(&self, record: SwapRequest) -> Result<SwapRequest, RepositoryError>;

    /// Look up a record by id.
    async fn find_by_id(&self, id: SwapRequestId) -> Result<Option<SwapRequest>, RepositoryError>;

    /// Look up a record and resolve both parties.
    ///
    /// The default joins through `directory`; adapters with a local copy of
    /// the principals may override it with a single query.
    async fn find_with_parties(
        &self,
        id: SwapRequestId,
        directory: &dyn PrincipalDirectory,
    ) -> Result<Option<SwapWithParties>, RepositoryError> {
        let Some(request) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let summaries = directory
            .summaries(&[request.requester_id, request.provider_id])
            .await
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;
        Ok(Some(SwapWithParties::from_map(request, &summaries)))
    }

    /// The pending record for a triple, if any.
    async fn find_pending(
        &self,
        requester: UserId,
        provider: UserId,
        skill: &SkillLabel,
    ) -> Result<Option<SwapRequest>, RepositoryError>;

    /// Records selected by `filter`, newest first.
    async fn find_many(&self, filter: &SwapFilter) -> Result<Vec<SwapRequest>, RepositoryError>;

    /// Number of records selected by `filter`.
    async fn count(&self, filter: &SwapFilter) -> Result<u64, RepositoryError>;

    /// Replace the record with `next` if its stored status is still `expected`.
    async fn compare_and_swap_status(
        &self,
        id: SwapRequestId,
        expected: SwapStatus,
        next: SwapRequest,
    ) -> Result<Conditional<SwapRequest>, RepositoryError>;

    /// Delete the record if its stored status is still `expected`.
    async fn delete_if_status(
        &self,
        id: SwapRequestId,
        expected: SwapStatus,
    ) -> Result<Conditional<()>, RepositoryError>;
}

// ─── In-memory adapter ───────────────────────────────────────────────

#[derive(Debug, Default)]
struct MemoryInner {
    records: HashMap<SwapRequestId, (u64, SwapRequest)>,
    next_seq: u64,
}

impl MemoryInner {
    fn pending_for(
        &self,
        requester: UserId,
        provider: UserId,
        skill: &SkillLabel,
    ) -> Option<&SwapRequest> {
        self.records.values().map(|(_, r)| r).find(|r| {
            r.status == SwapStatus::Pending
                && r.requester_id == requester
                && r.provider_id == provider
                && r.skill_requested == *skill
        })
    }
}

/// In-process repository.
///
/// Every operation runs under a single `parking_lot` lock acquisition, so the
/// uniqueness check and the insert, or the status check and the write, cannot
/// interleave with another caller. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SwapRequestRepository for MemoryRepository {
    async fn insert(&self, record: SwapRequest) -> Result<SwapRequest, RepositoryError> {
        let mut guard = self.inner.write();
        if record.status == SwapStatus::Pending
            && guard
                .pending_for(
                    record.requester_id,
                    record.provider_id,
                    &record.skill_requested,
                )
                .is_some()
        {
            return Err(RepositoryError::DuplicatePending);
        }
        let seq = guard.next_seq;
        guard.next_seq += 1;
        guard.records.insert(record.id, (seq, record.clone()));
        Ok(record)
    }

    async fn find_by_id(&self, id: SwapRequestId) -> Result<Option<SwapRequest>, RepositoryError> {
        Ok(self.inner.read().records.get(&id).map(|(_, r)| r.clone()))
    }

    async fn find_pending(
        &self,
        requester: UserId,
        provider: UserId,
        skill: &SkillLabel,
    ) -> Result<Option<SwapRequest>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .pending_for(requester, provider, skill)
            .cloned())
    }

    async fn find_many(&self, filter: &SwapFilter) -> Result<Vec<SwapRequest>, RepositoryError> {
        let guard = self.inner.read();
        let mut selected: Vec<&(u64, SwapRequest)> = guard
            .records
            .values()
            .filter(|(_, r)| filter.matches(r))
            .collect();
        // Newest first; insertion order breaks ties within the same instant.
        selected.sort_by(|(sa, a), (sb, b)| b.created_at.cmp(&a.created_at).then(sb.cmp(sa)));
        Ok(selected.into_iter().map(|(_, r)| r.clone()).collect())
    }

    async fn count(&self, filter: &SwapFilter) -> Result<u64, RepositoryError> {
        let guard = self.inner.read();
        Ok(guard
            .records
            .values()
            .filter(|(_, r)| filter.matches(r))
            .count() as u64)
    }

    async fn compare_and_swap_status(
        &self,
        id: SwapRequestId,
        expected: SwapStatus,
        next: SwapRequest,
    ) -> Result<Conditional<SwapRequest>, RepositoryError> {
        let mut guard = self.inner.write();
        let Some((_, stored)) = guard.records.get_mut(&id) else {
            return Ok(Conditional::NotFound);
        };
        if stored.status != expected {
            return Ok(Conditional::Conflict(stored.status));
        }
        *stored = next;
        Ok(Conditional::Applied(stored.clone()))
    }

    async fn delete_if_status(
        &self,
        id: SwapRequestId,
        expected: SwapStatus,
    ) -> Result<Conditional<()>, RepositoryError> {
        let mut guard = self.inner.write();
        match guard.records.get(&id) {
            None => Ok(Conditional::NotFound),
            Some((_, stored)) if stored.status != expected => {
                Ok(Conditional::Conflict(stored.status))
            }
            Some(_) => {
                guard.records.remove(&id);
                Ok(Conditional::Applied(()))
            }
        }
    }
}
