use super::{
    CredentialDisabler, CredentialFinder, CredentialPaginator, CredentialSaver, StoreError,
    StoreResult,
};
use crate::domain::{Credential, NewCredential};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{Instrument, info_span};
use uuid::Uuid;

const COLUMNS: &str =
    "id, subject_id, verifier, disabled, one_time, created_at, updated_at, valid_until";

/// Postgres-backed credential store over the `passwords` table.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find(&self, query: &str, subject_id: Uuid) -> StoreResult<Vec<Credential>> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query_as::<_, Credential>(query)
            .bind(subject_id)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }

        Ok(rows)
    }
}

#[async_trait]
impl CredentialFinder for PgStore {
    async fn find_all_by_subject(&self, subject_id: Uuid) -> StoreResult<Vec<Credential>> {
        let query = format!(
            "SELECT {COLUMNS} FROM passwords WHERE subject_id = $1 ORDER BY created_at, id"
        );
        self.find(&query, subject_id).await
    }

    async fn find_active_by_subject(&self, subject_id: Uuid) -> StoreResult<Vec<Credential>> {
        let query = format!(
            "SELECT {COLUMNS} FROM passwords WHERE subject_id = $1 AND disabled = FALSE ORDER BY created_at, id"
        );
        self.find(&query, subject_id).await
    }
}

#[async_trait]
impl CredentialSaver for PgStore {
    async fn insert(&self, credential: NewCredential) -> StoreResult<Credential> {
        let query = format!(
            r"
            INSERT INTO passwords (id, subject_id, verifier, one_time, valid_until)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query.as_str()
        );
        let inserted = sqlx::query_as::<_, Credential>(&query)
            .bind(Uuid::new_v4())
            .bind(credential.subject_id)
            .bind(&credential.verifier)
            .bind(credential.one_time)
            .bind(credential.valid_until)
            .fetch_one(&self.pool)
            .instrument(span)
            .await?;

        Ok(inserted)
    }
}

#[async_trait]
impl CredentialDisabler for PgStore {
    async fn disable_by_ids(&self, ids: &[Uuid]) -> StoreResult<bool> {
        if ids.is_empty() {
            return Err(StoreError::NotFound);
        }

        // Only enabled rows are touched so updated_at marks the transition.
        let query = r"
            UPDATE passwords
            SET disabled = TRUE,
                updated_at = NOW()
            WHERE id = ANY($1)
              AND disabled = FALSE
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(ids)
            .execute(&self.pool)
            .instrument(span)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(true)
    }
}

#[async_trait]
impl CredentialPaginator for PgStore {
    async fn count_by_subject(&self, subject_id: Uuid) -> StoreResult<i64> {
        let query = "SELECT COUNT(*) FROM passwords WHERE subject_id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let count: i64 = sqlx::query_scalar(query)
            .bind(subject_id)
            .fetch_one(&self.pool)
            .instrument(span)
            .await?;

        Ok(count)
    }

    async fn page(
        &self,
        subject_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Credential>> {
        let query = format!(
            "SELECT {COLUMNS} FROM passwords WHERE subject_id = $1 ORDER BY created_at, id LIMIT $2 OFFSET $3"
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let rows = sqlx::query_as::<_, Credential>(&query)
            .bind(subject_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        Ok(rows)
    }
}
