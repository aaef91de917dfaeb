//! Password policy: adding and checking passwords.
//!
//! This is the only place that decides whether a password is valid. Expired
//! and consumed one-time passwords are handed to the [`Blocker`]; the check
//! itself never writes to the store.

use crate::{
    blocker::Blocker,
    config::PasswordConfig,
    domain::{Clock, Credential, NewCredential},
    hasher::{HashError, Hasher},
    store::{CredentialRepository, StoreError, or_empty},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{JoinError, spawn_blocking};
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PasswordError {
    /// The login already has this password, enabled or not.
    #[error("password already exists")]
    AlreadyExists,

    #[error("password lifetime is out of range")]
    LifetimeOutOfRange,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("hashing task failed: {0}")]
    Task(#[from] JoinError),
}

#[derive(Clone)]
pub struct PasswordService {
    store: Arc<dyn CredentialRepository>,
    hasher: Arc<dyn Hasher>,
    blocker: Arc<Blocker>,
    clock: Arc<dyn Clock>,
    config: PasswordConfig,
}

impl PasswordService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialRepository>,
        hasher: Arc<dyn Hasher>,
        blocker: Arc<Blocker>,
        clock: Arc<dyn Clock>,
        config: PasswordConfig,
    ) -> Self {
        Self {
            store,
            hasher,
            blocker,
            clock,
            config,
        }
    }

    /// Store a new password for `subject_id`.
    ///
    /// Without `valid_until` the password lives for the configured lifetime.
    ///
    /// # Errors
    /// [`PasswordError::AlreadyExists`] if any record of the login, disabled or
    /// not, already matches `plaintext`; store and hashing failures otherwise.
    #[instrument(skip(self, plaintext))]
    pub async fn add(
        &self,
        subject_id: Uuid,
        plaintext: &str,
        one_time: bool,
        valid_until: Option<DateTime<Utc>>,
    ) -> Result<Credential, PasswordError> {
        let existing = or_empty(self.store.find_all_by_subject(subject_id).await)?;

        let hasher = Arc::clone(&self.hasher);
        let plaintext = plaintext.to_owned();
        let verifier = spawn_blocking(move || {
            if existing
                .iter()
                .any(|record| hasher.check(subject_id, &plaintext, &record.verifier))
            {
                return Err(PasswordError::AlreadyExists);
            }

            Ok(hasher.hash(subject_id, &plaintext)?)
        })
        .await??;

        let valid_until = match valid_until {
            Some(valid_until) => valid_until,
            None => self
                .clock
                .now()
                .checked_add_signed(self.config.lifetime())
                .ok_or(PasswordError::LifetimeOutOfRange)?,
        };

        let credential = self
            .store
            .insert(NewCredential {
                subject_id,
                verifier,
                one_time,
                valid_until,
            })
            .await?;

        debug!(id = %credential.id, %valid_until, "password added");

        Ok(credential)
    }

    /// Check `plaintext` against the enabled passwords of `subject_id`.
    ///
    /// Wrong password, expired password and unknown login all return
    /// `Ok(false)`. A matching expired password and a matching one-time
    /// password are registered for blocking.
    ///
    /// # Errors
    /// Store and hashing-task failures only.
    #[instrument(skip(self, plaintext))]
    pub async fn check(&self, subject_id: Uuid, plaintext: &str) -> Result<bool, PasswordError> {
        let records = or_empty(self.store.find_active_by_subject(subject_id).await)?;
        if records.is_empty() {
            return Ok(false);
        }

        let hasher = Arc::clone(&self.hasher);
        let plaintext = plaintext.to_owned();
        let matched = spawn_blocking(move || {
            records
                .into_iter()
                .find(|record| hasher.check(subject_id, &plaintext, &record.verifier))
        })
        .await?;

        let Some(record) = matched else {
            return Ok(false);
        };

        // Expiry wins over consumption: an expired one-time password is
        // registered once, as expired.
        if record.is_expired_at(self.clock.now()) {
            debug!(id = %record.id, "password expired");
            self.blocker.register(record.id);
            return Ok(false);
        }

        if record.one_time {
            debug!(id = %record.id, "one-time password consumed");
            self.blocker.register(record.id);
        }

        Ok(true)
    }

    /// Schedule a password for disablement; it stays usable until the next
    /// successful flush.
    pub fn revoke(&self, id: Uuid) {
        self.blocker.register(id);
    }
}
