//! In-memory store used as a test double.

use super::{
    CredentialDisabler, CredentialFinder, CredentialPaginator, CredentialSaver, StoreError,
    StoreResult,
};
use crate::domain::{Credential, NewCredential};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{
    Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Credential>>,
    disable_calls: Mutex<Vec<Vec<Uuid>>>,
    fail_reads: AtomicBool,
    fail_disable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, Vec<Credential>> {
        self.records.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn get(&self, id: Uuid) -> Option<Credential> {
        self.records().iter().find(|c| c.id == id).cloned()
    }

    pub fn all(&self) -> Vec<Credential> {
        self.records().clone()
    }

    /// Every batch handed to `disable_by_ids`, successful or not.
    pub fn disable_calls(&self) -> Vec<Vec<Uuid>> {
        self.disable_calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_disable(&self, fail: bool) {
        self.fail_disable.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn select(&self, subject_id: Uuid, active_only: bool) -> StoreResult<Vec<Credential>> {
        self.check_reads()?;
        let rows: Vec<Credential> = self
            .records()
            .iter()
            .filter(|c| c.subject_id == subject_id && !(active_only && c.disabled))
            .cloned()
            .collect();
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows)
    }
}

#[async_trait]
impl CredentialFinder for MemoryStore {
    async fn find_all_by_subject(&self, subject_id: Uuid) -> StoreResult<Vec<Credential>> {
        self.select(subject_id, false)
    }

    async fn find_active_by_subject(&self, subject_id: Uuid) -> StoreResult<Vec<Credential>> {
        self.select(subject_id, true)
    }
}

#[async_trait]
impl CredentialSaver for MemoryStore {
    async fn insert(&self, credential: NewCredential) -> StoreResult<Credential> {
        self.check_reads()?;
        let record = Credential {
            id: Uuid::new_v4(),
            subject_id: credential.subject_id,
            verifier: credential.verifier,
            disabled: false,
            one_time: credential.one_time,
            created_at: Utc::now(),
            updated_at: None,
            valid_until: credential.valid_until,
        };
        self.records().push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl CredentialDisabler for MemoryStore {
    async fn disable_by_ids(&self, ids: &[Uuid]) -> StoreResult<bool> {
        self.disable_calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(ids.to_vec());

        if self.fail_disable.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        let now = Utc::now();
        let mut changed = 0;
        for record in self.records().iter_mut() {
            if ids.contains(&record.id) && !record.disabled {
                record.disabled = true;
                record.updated_at = Some(now);
                changed += 1;
            }
        }

        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(true)
    }
}

#[async_trait]
impl CredentialPaginator for MemoryStore {
    async fn count_by_subject(&self, subject_id: Uuid) -> StoreResult<i64> {
        self.check_reads()?;
        let count = self
            .records()
            .iter()
            .filter(|c| c.subject_id == subject_id)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn page(
        &self,
        subject_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Credential>> {
        self.check_reads()?;
        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .records()
            .iter()
            .filter(|c| c.subject_id == subject_id)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn new_credential(subject_id: Uuid) -> NewCredential {
        NewCredential {
            subject_id,
            verifier: "verifier".to_string(),
            one_time: false,
            valid_until: Utc::now() + TimeDelta::hours(1),
        }
    }

    #[tokio::test]
    async fn disable_is_monotonic_and_reports_not_found_when_nothing_changes() {
        let store = MemoryStore::new();
        let record = store.insert(new_credential(Uuid::new_v4())).await.unwrap();

        assert!(store.disable_by_ids(&[record.id]).await.unwrap());
        let disabled = store.get(record.id).unwrap();
        assert!(disabled.disabled);
        assert!(disabled.updated_at.is_some());

        assert!(matches!(
            store.disable_by_ids(&[record.id]).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(store.disable_by_ids(&[]).await, Err(StoreError::NotFound)));
        assert_eq!(store.get(record.id).unwrap().updated_at, disabled.updated_at);
    }

    #[tokio::test]
    async fn find_active_skips_disabled() {
        let store = MemoryStore::new();
        let subject = Uuid::new_v4();
        let first = store.insert(new_credential(subject)).await.unwrap();
        store.insert(new_credential(subject)).await.unwrap();
        store.disable_by_ids(&[first.id]).await.unwrap();

        assert_eq!(store.find_all_by_subject(subject).await.unwrap().len(), 2);
        assert_eq!(store.find_active_by_subject(subject).await.unwrap().len(), 1);
        assert!(matches!(
            store.find_all_by_subject(Uuid::new_v4()).await,
            Err(StoreError::NotFound)
        ));
    }
}
