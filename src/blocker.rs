//! Pending-disable accumulator.
//!
//! Request handlers [`Blocker::register`] ids of passwords that must be
//! disabled; the repeater calls [`Blocker::flush`] to persist them in one bulk
//! update. Registration never touches the database.
//!
//! One mutex guards both the append and the capture-and-swap, and it is
//! released before the store is called, so a slow store never blocks
//! registrations. An id registered after a flush has swapped the set out
//! always lands in a later flush.
//!
//! If the bulk update fails the captured batch is dropped, not requeued.

use crate::store::{CredentialDisabler, StoreError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

pub struct Blocker {
    pending: Mutex<Vec<Uuid>>,
    store: Arc<dyn CredentialDisabler>,
}

impl Blocker {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialDisabler>) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            store,
        }
    }

    // The guarded Vec stays consistent even if a holder panicked.
    fn pending(&self) -> MutexGuard<'_, Vec<Uuid>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an id for disablement. Duplicates are kept.
    pub fn register(&self, id: Uuid) {
        self.pending().push(id);
        debug!(%id, "password registered for blocking");
    }

    /// Number of ids waiting for the next flush.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending().is_empty()
    }

    /// Disable every pending id with one store call.
    ///
    /// Returns how many ids were handed to the store. A `NotFound` answer
    /// (nothing left to disable) counts as success.
    ///
    /// # Errors
    /// Returns the store error; the captured ids are dropped in that case.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> Result<usize, StoreError> {
        let batch = std::mem::take(&mut *self.pending());

        if batch.is_empty() {
            return Ok(0);
        }

        match self.store.disable_by_ids(&batch).await {
            Ok(_) => {
                debug!(count = batch.len(), "passwords blocked");
                Ok(batch.len())
            }
            Err(StoreError::NotFound) => {
                debug!(count = batch.len(), "passwords already blocked");
                Ok(batch.len())
            }
            Err(err) => {
                warn!(dropped = batch.len(), "blocking batch dropped: {err}");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{StoreResult, memory::MemoryStore};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Records each batch; implements only the disable capability.
    #[derive(Default)]
    struct RecordingDisabler {
        batches: Mutex<Vec<Vec<Uuid>>>,
        calls: AtomicUsize,
    }

    impl RecordingDisabler {
        fn batches(&self) -> Vec<Vec<Uuid>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CredentialDisabler for RecordingDisabler {
        async fn disable_by_ids(&self, ids: &[Uuid]) -> StoreResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Give concurrent registrations a chance to interleave.
            tokio::task::yield_now().await;
            self.batches.lock().unwrap().push(ids.to_vec());
            Ok(true)
        }
    }

    /// Blocks inside the store call until released.
    struct GatedDisabler {
        gate: tokio::sync::Notify,
        entered: tokio::sync::Notify,
    }

    #[async_trait]
    impl CredentialDisabler for GatedDisabler {
        async fn disable_by_ids(&self, _ids: &[Uuid]) -> StoreResult<bool> {
            self.entered.notify_one();
            self.gate.notified().await;
            Ok(true)
        }
    }

    #[tokio::test]
    async fn empty_flush_does_not_touch_store() {
        let store = Arc::new(RecordingDisabler::default());
        let blocker = Blocker::new(store.clone());

        assert_eq!(blocker.flush().await.unwrap(), 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn flush_sends_one_batch_with_duplicates() {
        let store = Arc::new(RecordingDisabler::default());
        let blocker = Blocker::new(store.clone());
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();

        blocker.register(id);
        blocker.register(other);
        blocker.register(id);
        assert_eq!(blocker.len(), 3);

        assert_eq!(blocker.flush().await.unwrap(), 3);
        assert!(blocker.is_empty());
        assert_eq!(store.batches(), vec![vec![id, other, id]]);

        // Nothing left for the next cycle.
        assert_eq!(blocker.flush().await.unwrap(), 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn already_disabled_batch_is_not_an_error() {
        let store = Arc::new(MemoryStore::new());
        let blocker = Blocker::new(store.clone());

        blocker.register(Uuid::new_v4());
        assert_eq!(blocker.flush().await.unwrap(), 1);
        assert_eq!(store.disable_calls().len(), 1);
    }

    // Documented limitation: a failed flush loses its batch.
    #[tokio::test]
    async fn failed_flush_drops_the_batch() {
        let store = Arc::new(MemoryStore::new());
        store.fail_disable(true);
        let blocker = Blocker::new(store.clone());
        let id = Uuid::new_v4();

        blocker.register(id);
        assert!(matches!(
            blocker.flush().await,
            Err(StoreError::Database(_))
        ));
        assert!(blocker.is_empty());

        store.fail_disable(false);
        assert_eq!(blocker.flush().await.unwrap(), 0);
        assert_eq!(store.disable_calls(), vec![vec![id]]);
    }

    #[tokio::test]
    async fn registration_is_not_blocked_by_a_slow_store() {
        let store = Arc::new(GatedDisabler {
            gate: tokio::sync::Notify::new(),
            entered: tokio::sync::Notify::new(),
        });
        let blocker = Arc::new(Blocker::new(store.clone()));
        let first = Uuid::new_v4();
        blocker.register(first);

        let flushing = {
            let blocker = blocker.clone();
            tokio::spawn(async move { blocker.flush().await })
        };
        store.entered.notified().await;

        // The store call is in progress; registration must still go through
        // and must not join the batch already captured.
        let late = Uuid::new_v4();
        blocker.register(late);
        assert_eq!(blocker.len(), 1);

        store.gate.notify_one();
        assert_eq!(flushing.await.unwrap().unwrap(), 1);
        assert_eq!(blocker.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_land_in_exactly_one_batch() {
        const WRITERS: usize = 8;
        const PER_WRITER: usize = 250;
        const FLUSHERS: usize = 4;

        let store = Arc::new(RecordingDisabler::default());
        let blocker = Arc::new(Blocker::new(store.clone()));

        let mut writers = Vec::new();
        for _ in 0..WRITERS {
            let blocker = blocker.clone();
            writers.push(tokio::spawn(async move {
                let mut ids = Vec::with_capacity(PER_WRITER);
                for i in 0..PER_WRITER {
                    let id = Uuid::new_v4();
                    blocker.register(id);
                    ids.push(id);
                    if i % 16 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
                ids
            }));
        }

        let mut flushers = Vec::new();
        for _ in 0..FLUSHERS {
            let blocker = blocker.clone();
            flushers.push(tokio::spawn(async move {
                let mut flushed = 0;
                for _ in 0..20 {
                    flushed += blocker.flush().await.unwrap();
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                flushed
            }));
        }

        let mut registered = Vec::new();
        for writer in writers {
            registered.extend(writer.await.unwrap());
        }
        let mut flushed = 0;
        for flusher in flushers {
            flushed += flusher.await.unwrap();
        }
        flushed += blocker.flush().await.unwrap();

        assert_eq!(registered.len(), WRITERS * PER_WRITER);
        assert_eq!(flushed, registered.len());

        let mut seen: HashMap<Uuid, usize> = HashMap::new();
        for batch in store.batches() {
            for id in batch {
                *seen.entry(id).or_default() += 1;
            }
        }
        assert_eq!(seen.len(), registered.len());
        assert!(registered.iter().all(|id| seen.get(id) == Some(&1)));
    }
}
