//! Read, store, and clear operations
//!
//! Each method enqueues its transform before returning, so operations run
//! in the order they were called even if their futures are awaited out of
//! order or not at all.

use super::PersistentStore;
use crate::errors::{CacheError, Result};
use crate::payload::{AsyncResult, CachePayload};
use crate::record::CacheRecord;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

impl<T: CacheRecord> PersistentStore<T> {
    /// Non-blocking view of the record
    ///
    /// An unloaded store schedules a background load and answers `Pending`;
    /// subscribers hear about the load through the notifier. A parked load
    /// failure is reported as `Failure` until a store, prime, or clear
    /// succeeds.
    pub async fn retrieve_data(&self) -> AsyncResult<T> {
        let payload = match self.queue.read_if_present().await {
            Ok(payload) => payload,
            Err(e) => return AsyncResult::Failure(Arc::new(e)),
        };

        if !payload.is_loaded() {
            self.schedule_load();
            return AsyncResult::Pending;
        }

        match self.inner.current_failure() {
            Some(failure) => AsyncResult::Failure(failure),
            None => AsyncResult::Success(payload.value),
        }
    }

    fn schedule_load(&self) {
        debug!(cache = %self.inner.name, "scheduling background load");
        let inner = Arc::clone(&self.inner);
        // Already enqueued; nobody needs to await the result.
        drop(self.queue.update_if_present(move |payload| async move {
            Ok(inner.load_file_cache(payload).await)
        }));
    }

    /// The record, loading it from disk first if the store is unloaded
    ///
    /// Load failures do not fail this future: they land in the sticky slot
    /// and the in-memory value is returned.
    pub fn read_data(&self) -> impl Future<Output = Result<T>> + Send + 'static {
        let inner = Arc::clone(&self.inner);
        self.queue.update_with_custom_result(move |payload| async move {
            let payload = inner.load_file_cache(payload).await;
            let value = payload.value.clone();
            Ok((payload, value))
        })
    }

    /// Apply `update` to the record and persist the result
    ///
    /// With `update_in_memory_cache == false` only the file changes and the
    /// in-memory payload is left exactly as it was.
    pub fn store_data<F>(
        &self,
        update_in_memory_cache: bool,
        update: F,
    ) -> impl Future<Output = Result<()>> + Send + 'static
    where
        F: FnOnce(T) -> T + Send + 'static,
    {
        self.store_data_with_custom_result(update_in_memory_cache, move |value| (update(value), ()))
    }

    /// Like [`store_data`](Self::store_data), with an extra result from the update
    pub fn store_data_with_custom_result<V, F>(
        &self,
        update_in_memory_cache: bool,
        update: F,
    ) -> impl Future<Output = Result<V>> + Send + 'static
    where
        V: Send + 'static,
        F: FnOnce(T) -> (T, V) + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        self.queue.update_with_custom_result(move |payload| async move {
            let (stored, result) = inner.store_file_cache(&payload, update).await?;
            let next = if update_in_memory_cache { stored } else { payload };
            Ok::<_, CacheError>((next, result))
        })
    }

    /// Delete the backing file and reset to the initial value
    ///
    /// Subscribers are always notified, even if the store was already
    /// unloaded at its initial value.
    pub fn clear_cache(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        let inner = Arc::clone(&self.inner);
        self.queue.reset(move |_payload| async move {
            inner.delete_file_cache().await?;
            inner.clear_failure();
            debug!(cache = %inner.name, "cleared cache");
            Ok::<_, CacheError>((CachePayload::unloaded(inner.initial.clone()), ()))
        })
    }
}
