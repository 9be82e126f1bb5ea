//! Ownership checks for profile mutations.
//!
//! The check is a read followed later by a separate write, so it is not atomic
//! against a concurrent change of owner. Profiles are never transferred between
//! accounts, which makes that window irrelevant. Call [`assert_owner`] as the
//! last step before applying the mutation.

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::ApiError,
    profiles::{repo::ProfileStore, repo_types::ProfileKind},
};

#[derive(Debug, Error)]
pub enum OwnershipError {
    #[error("{0} not found")]
    NotFound(ProfileKind),
    #[error("{0} belongs to another user")]
    Forbidden(ProfileKind),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub async fn assert_owner(
    profiles: &dyn ProfileStore,
    actor_id: Uuid,
    resource_id: Uuid,
    kind: ProfileKind,
) -> Result<(), OwnershipError> {
    let owner = match kind {
        ProfileKind::Engineer => profiles
            .find_engineer(resource_id)
            .await?
            .map(|e| e.user_id),
        ProfileKind::Recruiter => profiles
            .find_recruiter(resource_id)
            .await?
            .map(|r| r.user_id),
    };

    match owner {
        None => Err(OwnershipError::NotFound(kind)),
        Some(owner) if owner != actor_id => {
            warn!(%actor_id, %resource_id, %kind, "ownership check failed");
            Err(OwnershipError::Forbidden(kind))
        }
        Some(_) => Ok(()),
    }
}

impl OwnershipError {
    /// Maps onto the envelope using `scope` (e.g. `engineer.update`) as the code prefix.
    pub fn into_api(self, scope: &str, message: &str) -> ApiError {
        match self {
            OwnershipError::NotFound(kind) => ApiError::not_found(
                &format!("{scope}.not_found"),
                message,
                format!("{kind} not found"),
            ),
            OwnershipError::Forbidden(kind) => ApiError::forbidden(
                &format!("{scope}.forbidden"),
                message,
                format!("can't update {kind} belonging to other user"),
            ),
            OwnershipError::Store(e) => {
                ApiError::upstream(&format!("{scope}.check_owner"), message, e)
            }
        }
    }
}
