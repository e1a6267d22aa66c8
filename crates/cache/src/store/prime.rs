//! Cache priming
//!
//! Priming makes sure the backing file exists and reflects a desired
//! transform. A brand-new cache (no usable file, or loaded but never
//! flushed) is always written. An already-persisted cache is only rewritten
//! under `UpdateMode::UpdateAlways`.

use super::PersistentStore;
use crate::errors::{CacheError, Result};
use crate::payload::{CachePayload, CacheState};
use crate::record::CacheRecord;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Whether priming re-applies its transform to an already-persisted value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Only transform and write a cache that has never been persisted
    UpdateIfNewCache,
    /// Transform and rewrite every time
    UpdateAlways,
}

/// Whether the primed value also replaces the in-memory snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    PublishToInMemoryCache,
    /// Persist the primed value but keep serving the previous in-memory
    /// value until the next explicit update
    DoNotPublishToInMemoryCache,
}

impl<T: CacheRecord> PersistentStore<T> {
    /// Prime disk and memory, applying `update` as dictated by `update_mode`
    ///
    /// When priming from `Unloaded` finds no usable file there is no previous
    /// in-memory value, so the computed value becomes the snapshot whatever
    /// `publish_mode` says. A successful prime clears any sticky failure.
    pub fn prime_in_memory_and_disk_cache<F>(
        &self,
        update_mode: UpdateMode,
        publish_mode: PublishMode,
        update: F,
    ) -> impl Future<Output = Result<()>> + Send + 'static
    where
        F: FnOnce(T) -> T + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        self.queue.update_with_custom_result(move |cached| async move {
            let (loaded, previous, is_new_cache) = match cached.state {
                CacheState::Unloaded => {
                    let loaded = inner.load_file_cache(cached).await;
                    let is_new_cache = loaded.state == CacheState::InMemoryOnly;
                    let previous = (!is_new_cache).then(|| loaded.value.clone());
                    (loaded, previous, is_new_cache)
                }
                // Loaded earlier but never flushed: still counts as new.
                CacheState::InMemoryOnly => {
                    let previous = Some(cached.value.clone());
                    (cached, previous, true)
                }
                CacheState::InMemoryAndOnDisk => {
                    let previous = Some(cached.value.clone());
                    (cached, previous, false)
                }
            };

            let stored = if is_new_cache || update_mode == UpdateMode::UpdateAlways {
                debug!(cache = %inner.name, is_new_cache, ?update_mode, "priming cache file");
                let (stored, ()) = inner
                    .store_file_cache(&loaded, move |value| (update(value), ()))
                    .await?;
                stored
            } else {
                loaded
            };
            inner.clear_failure();

            let next = match (publish_mode, previous) {
                (PublishMode::DoNotPublishToInMemoryCache, Some(previous)) => {
                    CachePayload::new(stored.state, previous)
                }
                _ => stored,
            };
            Ok::<_, CacheError>((next, ()))
        })
    }

    /// Prime with no transform: persist whatever the store holds
    pub fn prime_cache(
        &self,
        update_mode: UpdateMode,
        publish_mode: PublishMode,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        self.prime_in_memory_and_disk_cache(update_mode, publish_mode, |value| value)
    }
}
