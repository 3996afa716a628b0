//! # Principal Directory
//!
//! Read-only view of the external identity store. Registration, profile
//! editing and credential storage live elsewhere; this service only needs to
//! know whether a principal exists, whether it is active, and what to show
//! for it next to a swap request.
//!
//! [`MemoryDirectory`] backs development and tests. The PostgreSQL adapter is
//! [`crate::db::principals::PgPrincipalDirectory`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use skillswap_core::UserId;
use thiserror::Error;
use utoipa::ToSchema;

/// An identity resolved from a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Stable identifier.
    pub id: UserId,
    /// Contact address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Deactivated principals hold valid tokens but are refused service.
    pub active: bool,
}

impl Principal {
    /// The public projection embedded in swap request views.
    pub fn summary(&self) -> PrincipalSummary {
        PrincipalSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public fields of a principal, shown alongside the requests they take part in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PrincipalSummary {
    #[schema(value_type = String, format = Uuid)]
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// The identity store could not answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("principal directory unavailable: {0}")]
    Unavailable(String),
}

/// Lookup contract for the external identity store.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Resolve a principal by id. `Ok(None)` means it no longer exists.
    async fn find_by_id(&self, id: UserId) -> Result<Option<Principal>, DirectoryError>;

    /// Resolve summaries for a batch of ids. Unknown ids are omitted.
    async fn summaries(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, PrincipalSummary>, DirectoryError>;
}

/// In-process directory.
///
/// Clones share the same underlying map. The lock is never held across an
/// `.await`.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    principals: Arc<RwLock<HashMap<UserId, Principal>>>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a principal.
    pub fn upsert(&self, principal: Principal) {
        self.principals.write().insert(principal.id, principal);
    }

    /// Register a new active principal and return its id.
    pub fn register(&self, name: &str, email: &str) -> UserId {
        let id = UserId::new();
        self.upsert(Principal {
            id,
            email: email.to_string(),
            name: name.to_string(),
            active: true,
        });
        id
    }

    /// Mark a principal inactive. Returns `false` if it does not exist.
    pub fn deactivate(&self, id: UserId) -> bool {
        self.principals
            .write()
            .get_mut(&id)
            .map(|p| p.active = false)
            .is_some()
    }

    /// Remove a principal entirely.
    pub fn remove(&self, id: UserId) -> Option<Principal> {
        self.principals.write().remove(&id)
    }

    /// Number of known principals.
    pub fn len(&self) -> usize {
        self.principals.read().len()
    }

    /// Whether no principal is known.
    pub fn is_empty(&self) -> bool {
        self.principals.read().is_empty()
    }
}

#[async_trait]
impl PrincipalDirectory for MemoryDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<Option<Principal>, DirectoryError> {
        Ok(self.principals.read().get(&id).cloned())
    }

    async fn summaries(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, PrincipalSummary>, DirectoryError> {
        let guard = self.principals.read();
        Ok(ids
            .iter()
            .filter_map(|id| guard.get(id).map(|p| (*id, p.summary())))
            .collect())
    }
}
