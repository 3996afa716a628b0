//! Swap request persistence on the `swap_requests` table.
//!
//! Lifecycle rules are enforced by `skillswap-state`, not in SQL. The table
//! carries two storage guarantees: the partial unique index
//! `swap_requests_pending_triple` and the status precondition in every
//! `UPDATE`/`DELETE ... WHERE status = $2`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skillswap_core::{Note, SkillLabel, SwapRequestId, UserId, ValidationError};
use skillswap_state::{SwapRequest, SwapStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::directory::{PrincipalDirectory, PrincipalSummary};
use crate::repository::{
    Conditional, RepositoryError, SwapFilter, SwapRequestRepository, SwapWithParties,
};

const PENDING_TRIPLE_INDEX: &str = "swap_requests_pending_triple";

macro_rules! select_swap {
    ($tail:literal) => {
        concat!(
            "SELECT id, requester_id, provider_id, skill_requested, skill_category, message, \
             response_message, status, priority, preferred_meeting_type, timeline, responded_at, \
             created_at, updated_at FROM swap_requests ",
            $tail
        )
    };
}

const FILTER_WHERE: &str = "WHERE CASE $2 \
         WHEN 'sent' THEN requester_id = $1 \
         WHEN 'received' THEN provider_id = $1 \
         ELSE (requester_id = $1 OR provider_id = $1) END \
     AND ($3::text IS NULL OR status = $3)";

/// Repository backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgSwapRequestRepository {
    pool: PgPool,
}

impl PgSwapRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_status(&self, id: SwapRequestId) -> Result<Option<SwapStatus>, RepositoryError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM swap_requests WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_error)?;
        status
            .map(|s| s.parse::<SwapStatus>().map_err(corrupt(*id.as_uuid(), "status")))
            .transpose()
    }
}

/// Map a driver error, recognising the pending-triple constraint.
fn storage_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() && db.constraint() == Some(PENDING_TRIPLE_INDEX) {
            return RepositoryError::DuplicatePending;
        }
    }
    tracing::error!(error = %err, "swap_requests query failed");
    RepositoryError::Unavailable(err.to_string())
}

fn corrupt(id: Uuid, column: &'static str) -> impl Fn(ValidationError) -> RepositoryError {
    move |e| {
        tracing::error!(
            id = %id,
            column,
            error = %e,
            "undecodable swap_requests row; investigate possible data corruption"
        );
        RepositoryError::Corrupt(format!("{id}: {column}: {e}"))
    }
}

#[async_trait]
impl SwapRequestRepository for PgSwapRequestRepository {
    async fn insert(&self, record: SwapRequest) -> Result<SwapRequest, RepositoryError> {
        sqlx::query(
            "INSERT INTO swap_requests (id, requester_id, provider_id, skill_requested, skill_category,
                 message, response_message, status, priority, preferred_meeting_type, timeline,
                 responded_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(record.id.as_uuid())
        .bind(record.requester_id.as_uuid())
        .bind(record.provider_id.as_uuid())
        .bind(record.skill_requested.as_str())
        .bind(record.skill_category.as_str())
        .bind(record.message.as_str())
        .bind(record.response_message.as_str())
        .bind(record.status.as_str())
        .bind(record.priority.as_str())
        .bind(record.preferred_meeting_type.as_str())
        .bind(record.timeline.as_str())
        .bind(record.responded_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(record)
    }

    async fn find_by_id(&self, id: SwapRequestId) -> Result<Option<SwapRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, SwapRequestRow>(select_swap!("WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.map(SwapRequestRow::into_record).transpose()
    }

    async fn find_with_parties(
        &self,
        id: SwapRequestId,
        _directory: &dyn PrincipalDirectory,
    ) -> Result<Option<SwapWithParties>, RepositoryError> {
        let row = sqlx::query_as::<_, SwapWithPartiesRow>(
            "SELECT s.id, s.requester_id, s.provider_id, s.skill_requested, s.skill_category,
                    s.message, s.response_message, s.status, s.priority, s.preferred_meeting_type,
                    s.timeline, s.responded_at, s.created_at, s.updated_at,
                    r.name AS requester_name, r.email AS requester_email,
                    p.name AS provider_name, p.email AS provider_email
             FROM swap_requests s
             LEFT JOIN users r ON r.id = s.requester_id
             LEFT JOIN users p ON p.id = s.provider_id
             WHERE s.id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.map(SwapWithPartiesRow::into_view).transpose()
    }

    async fn find_pending(
        &self,
        requester: UserId,
        provider: UserId,
        skill: &SkillLabel,
    ) -> Result<Option<SwapRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, SwapRequestRow>(select_swap!(
            "WHERE requester_id = $1 AND provider_id = $2 AND skill_requested = $3 \
             AND status = 'pending'"
        ))
        .bind(requester.as_uuid())
        .bind(provider.as_uuid())
        .bind(skill.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.map(SwapRequestRow::into_record).transpose()
    }

    async fn find_many(&self, filter: &SwapFilter) -> Result<Vec<SwapRequest>, RepositoryError> {
        let sql = format!(
            "{} {FILTER_WHERE} ORDER BY created_at DESC, id DESC",
            select_swap!("")
        );
        let rows = sqlx::query_as::<_, SwapRequestRow>(&sql)
            .bind(filter.user.as_uuid())
            .bind(filter.scope.as_str())
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        rows.into_iter().map(SwapRequestRow::into_record).collect()
    }

    async fn count(&self, filter: &SwapFilter) -> Result<u64, RepositoryError> {
        let sql = format!("SELECT COUNT(*) FROM swap_requests {FILTER_WHERE}");
        let n: i64 = sqlx::query_scalar(&sql)
            .bind(filter.user.as_uuid())
            .bind(filter.scope.as_str())
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(u64::try_from(n).unwrap_or(0))
    }

    async fn compare_and_swap_status(
        &self,
        id: SwapRequestId,
        expected: SwapStatus,
        next: SwapRequest,
    ) -> Result<Conditional<SwapRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, SwapRequestRow>(
            "UPDATE swap_requests
             SET status = $3, response_message = $4, responded_at = $5, updated_at = $6
             WHERE id = $1 AND status = $2
             RETURNING id, requester_id, provider_id, skill_requested, skill_category, message,
                       response_message, status, priority, preferred_meeting_type, timeline,
                       responded_at, created_at, updated_at",
        )
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .bind(next.status.as_str())
        .bind(next.response_message.as_str())
        .bind(next.responded_at)
        .bind(next.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        if let Some(row) = row {
            return row.into_record().map(Conditional::Applied);
        }
        Ok(match self.current_status(id).await? {
            None => Conditional::NotFound,
            Some(status) => Conditional::Conflict(status),
        })
    }

    async fn delete_if_status(
        &self,
        id: SwapRequestId,
        expected: SwapStatus,
    ) -> Result<Conditional<()>, RepositoryError> {
        let result = sqlx::query("DELETE FROM swap_requests WHERE id = $1 AND status = $2")
            .bind(id.as_uuid())
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() > 0 {
            return Ok(Conditional::Applied(()));
        }
        Ok(match self.current_status(id).await? {
            None => Conditional::NotFound,
            Some(status) => Conditional::Conflict(status),
        })
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct SwapRequestRow {
    id: Uuid,
    requester_id: Uuid,
    provider_id: Uuid,
    skill_requested: String,
    skill_category: String,
    message: String,
    response_message: String,
    status: String,
    priority: String,
    preferred_meeting_type: String,
    timeline: String,
    responded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SwapRequestRow {
    /// Decode a row. Unknown enum strings are reported as corruption rather
    /// than defaulted, so a bad row never silently changes state.
    fn into_record(self) -> Result<SwapRequest, RepositoryError> {
        let id = self.id;
        Ok(SwapRequest {
            id: SwapRequestId::from_uuid(id),
            requester_id: UserId::from_uuid(self.requester_id),
            provider_id: UserId::from_uuid(self.provider_id),
            skill_requested: SkillLabel::new("skillRequested", self.skill_requested)
                .map_err(corrupt(id, "skill_requested"))?,
            skill_category: SkillLabel::new("skillCategory", self.skill_category)
                .map_err(corrupt(id, "skill_category"))?,
            message: Note::new("message", self.message).map_err(corrupt(id, "message"))?,
            response_message: Note::new("responseMessage", self.response_message)
                .map_err(corrupt(id, "response_message"))?,
            status: self.status.parse().map_err(corrupt(id, "status"))?,
            priority: self.priority.parse().map_err(corrupt(id, "priority"))?,
            preferred_meeting_type: self
                .preferred_meeting_type
                .parse()
                .map_err(corrupt(id, "preferred_meeting_type"))?,
            timeline: self.timeline.parse().map_err(corrupt(id, "timeline"))?,
            responded_at: self.responded_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SwapWithPartiesRow {
    #[sqlx(flatten)]
    swap: SwapRequestRow,
    requester_name: Option<String>,
    requester_email: Option<String>,
    provider_name: Option<String>,
    provider_email: Option<String>,
}

impl SwapWithPartiesRow {
    fn into_view(self) -> Result<SwapWithParties, RepositoryError> {
        let request = self.swap.into_record()?;
        let summary = |id: UserId, name: Option<String>, email: Option<String>| {
            Some(PrincipalSummary {
                id,
                name: name?,
                email: email?,
            })
        };
        Ok(SwapWithParties {
            requester: summary(
                request.requester_id,
                self.requester_name,
                self.requester_email,
            ),
            provider: summary(request.provider_id, self.provider_name, self.provider_email),
            request,
        })
    }
}
