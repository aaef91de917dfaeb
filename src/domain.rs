use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Row, postgres::PgRow};
use std::fmt;
use uuid::Uuid;

/// A stored password for one login.
///
/// `disabled` only ever moves from `false` to `true`; `updated_at` records when
/// that happened.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub verifier: String,
    pub disabled: bool,
    pub one_time: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub valid_until: DateTime<Utc>,
}

impl Credential {
    /// A credential is expired once `valid_until` is at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until <= now
    }
}

// Verifiers stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("subject_id", &self.subject_id)
            .field("disabled", &self.disabled)
            .field("one_time", &self.one_time)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("valid_until", &self.valid_until)
            .finish_non_exhaustive()
    }
}

impl<'r> FromRow<'r, PgRow> for Credential {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            subject_id: row.try_get("subject_id")?,
            verifier: row.try_get("verifier")?,
            disabled: row.try_get("disabled")?,
            one_time: row.try_get("one_time")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            valid_until: row.try_get("valid_until")?,
        })
    }
}

/// Everything the store needs to persist a credential; id and creation time
/// are assigned by the store.
#[derive(Clone)]
pub struct NewCredential {
    pub subject_id: Uuid,
    pub verifier: String,
    pub one_time: bool,
    pub valid_until: DateTime<Utc>,
}

/// Public projection of a credential, without its verifier.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CredentialView {
    pub id: Uuid,
    pub login: Uuid,
    pub one_time: bool,
    pub disabled: bool,
    pub valid_until: DateTime<Utc>,
}

impl From<&Credential> for CredentialView {
    fn from(credential: &Credential) -> Self {
        Self {
            id: credential.id,
            login: credential.subject_id,
            one_time: credential.one_time,
            disabled: credential.disabled,
            valid_until: credential.valid_until,
        }
    }
}

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
