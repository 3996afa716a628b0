//! Principal lookups on the `users` table.

use std::collections::HashMap;

use async_trait::async_trait;
use skillswap_core::UserId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::directory::{DirectoryError, Principal, PrincipalDirectory, PrincipalSummary};

/// Directory backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgPrincipalDirectory {
    pool: PgPool,
}

impl PgPrincipalDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(err: sqlx::Error) -> DirectoryError {
    tracing::error!(error = %err, "users query failed");
    DirectoryError::Unavailable(err.to_string())
}

#[async_trait]
impl PrincipalDirectory for PgPrincipalDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<Option<Principal>, DirectoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, is_active FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(row.map(UserRow::into_principal))
    }

    async fn summaries(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, PrincipalSummary>, DirectoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, is_active FROM users WHERE id = ANY($1)",
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let p = row.into_principal();
                (p.id, p.summary())
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    is_active: bool,
}

impl UserRow {
    fn into_principal(self) -> Principal {
        Principal {
            id: UserId::from_uuid(self.id),
            email: self.email,
            name: self.name,
            active: self.is_active,
        }
    }
}
