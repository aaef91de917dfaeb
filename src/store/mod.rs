//! Credential persistence.
//!
//! The store contract is split into narrow capabilities so each consumer only
//! depends on what it uses: the password service finds and saves, the blocker
//! disables, the listing endpoint pages. [`CredentialStore`] is the composite
//! implemented by the concrete backends.

use crate::domain::{Credential, NewCredential};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod postgres;

#[cfg(test)]
pub(crate) mod memory;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The query matched (or changed) no rows.
    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CredentialFinder: Send + Sync {
    /// All credentials of a login, disabled ones included.
    async fn find_all_by_subject(&self, subject_id: Uuid) -> StoreResult<Vec<Credential>>;

    /// Credentials of a login that are not disabled (expired ones included).
    async fn find_active_by_subject(&self, subject_id: Uuid) -> StoreResult<Vec<Credential>>;
}

#[async_trait]
pub trait CredentialSaver: Send + Sync {
    async fn insert(&self, credential: NewCredential) -> StoreResult<Credential>;
}

#[async_trait]
pub trait CredentialDisabler: Send + Sync {
    /// Disable every enabled credential in `ids`.
    ///
    /// Returns `Ok(true)` when at least one row changed and
    /// [`StoreError::NotFound`] when none did.
    async fn disable_by_ids(&self, ids: &[Uuid]) -> StoreResult<bool>;
}

#[async_trait]
pub trait CredentialPaginator: Send + Sync {
    async fn count_by_subject(&self, subject_id: Uuid) -> StoreResult<i64>;

    /// One page of a login's credentials; an empty page is not an error.
    async fn page(&self, subject_id: Uuid, offset: i64, limit: i64)
        -> StoreResult<Vec<Credential>>;
}

/// What the password service needs from storage.
pub trait CredentialRepository: CredentialFinder + CredentialSaver {}

impl<T: CredentialFinder + CredentialSaver> CredentialRepository for T {}

/// Every capability at once; implemented by the concrete backends.
pub trait CredentialStore:
    CredentialRepository + CredentialDisabler + CredentialPaginator
{
}

impl<T: CredentialRepository + CredentialDisabler + CredentialPaginator> CredentialStore for T {}

/// Maps `NotFound` to an empty list; the callers treat both as "no records".
pub(crate) fn or_empty(result: StoreResult<Vec<Credential>>) -> StoreResult<Vec<Credential>> {
    match result {
        Err(StoreError::NotFound) => Ok(Vec::new()),
        other => other,
    }
}
