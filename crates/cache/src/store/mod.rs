//! Persistent record store
//!
//! A `PersistentStore` keeps one record in memory and in one backing file.
//! Every operation is a transform submitted to the store's `UpdateQueue`,
//! so file I/O for one store never interleaves. Read failures are parked in
//! a sticky-failure slot instead of failing the read, leaving the store
//! usable with whatever it holds in memory.

mod disk;
mod operations;
mod prime;


pub use prime::{PublishMode, UpdateMode};

use crate::errors::CacheError;
use crate::notify::{ChangeNotifier, ProviderId};
use crate::payload::CachePayload;
use crate::queue::UpdateQueue;
use crate::record::CacheRecord;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;

/// A typed record cached in memory and persisted to a single file
pub struct PersistentStore<T> {
    inner: Arc<StoreInner<T>>,
    queue: UpdateQueue<T>,
}

/// State shared between a store handle and the transforms it submits
pub(crate) struct StoreInner<T> {
    name: String,
    cache_file: PathBuf,
    initial: T,
    /// Last deferred load failure; guarded separately from the queue
    failure: Mutex<Option<Arc<CacheError>>>,
}

impl<T: CacheRecord> PersistentStore<T> {
    pub(crate) fn new(
        runtime: &Handle,
        name: impl Into<String>,
        cache_file: PathBuf,
        initial: T,
        provider_id: ProviderId,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        let inner = Arc::new(StoreInner {
            name: name.into(),
            cache_file,
            initial: initial.clone(),
            failure: Mutex::new(None),
        });
        let queue = UpdateQueue::spawn(runtime, CachePayload::unloaded(initial), provider_id, notifier);
        Self { inner, queue }
    }

    /// Current payload, including its load state
    pub fn payload(&self) -> impl std::future::Future<Output = crate::Result<CachePayload<T>>> + Send + 'static {
        self.queue.read_if_present()
    }
}

impl<T> PersistentStore<T> {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Backing file for this store
    pub fn cache_file(&self) -> &Path {
        &self.inner.cache_file
    }

    pub fn provider_id(&self) -> &ProviderId {
        self.queue.provider_id()
    }

    /// The value the store resets to on clear
    pub fn initial_value(&self) -> &T {
        &self.inner.initial
    }
}

impl<T> Clone for PersistentStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            queue: self.queue.clone(),
        }
    }
}

impl<T> std::fmt::Debug for PersistentStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore")
            .field("name", &self.inner.name)
            .field("cache_file", &self.inner.cache_file)
            .field("queue", &self.queue)
            .finish()
    }
}

impl<T> StoreInner<T> {
    fn current_failure(&self) -> Option<Arc<CacheError>> {
        self.failure.lock().clone()
    }

    fn record_failure(&self, error: CacheError) {
        *self.failure.lock() = Some(Arc::new(error));
    }

    fn clear_failure(&self) {
        self.failure.lock().take();
    }
}
