//! Backing file I/O for a store
//!
//! These run inside queue transforms, so at most one of them touches a given
//! file at a time within the process.

use super::StoreInner;
use crate::errors::{write_recovery_hint, CacheError, RecoveryHint, Result};
use crate::payload::{CachePayload, CacheState};
use crate::record::CacheRecord;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

impl<T: CacheRecord> StoreInner<T> {
    /// Load the backing file into `current`
    ///
    /// Never fails: a missing file yields `InMemoryOnly`, an unreadable or
    /// corrupt one yields `InMemoryOnly` plus a sticky failure. Bytes are
    /// merged into the in-memory value rather than the schema default. A
    /// payload that already left `Unloaded` is returned as-is so a second
    /// load never merges twice.
    pub(super) async fn load_file_cache(&self, current: CachePayload<T>) -> CachePayload<T> {
        if current.is_loaded() {
            return current;
        }

        let bytes = match fs::read(&self.cache_file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(cache = %self.name, "no cache file yet, starting from memory");
                return current.with_state(CacheState::InMemoryOnly);
            }
            Err(e) => {
                warn!(cache = %self.name, path = %self.cache_file.display(), error = %e, "failed to read cache file");
                self.record_failure(CacheError::DiskRead {
                    path: self.cache_file.clone(),
                    source: Box::new(e),
                    recovery_hint: RecoveryHint::Retry {
                        after: Duration::from_millis(100),
                    },
                });
                return current.with_state(CacheState::InMemoryOnly);
            }
        };

        match T::merge_from(&bytes, &current.value) {
            Ok(value) => {
                debug!(cache = %self.name, bytes = bytes.len(), "loaded cache file");
                CachePayload::new(CacheState::InMemoryAndOnDisk, value)
            }
            Err(source) => {
                warn!(cache = %self.name, path = %self.cache_file.display(), error = %source, "cache file is corrupt");
                self.record_failure(CacheError::DiskRead {
                    path: self.cache_file.clone(),
                    source,
                    recovery_hint: RecoveryHint::ClearAndRetry,
                });
                current.with_state(CacheState::InMemoryOnly)
            }
        }
    }

    /// Apply `update` to the current value and overwrite the backing file
    ///
    /// Returns the new payload tagged `InMemoryAndOnDisk` alongside the
    /// update's extra result. The whole file is rewritten; there is no
    /// journal or temp-file swap.
    pub(super) async fn store_file_cache<V, F>(
        &self,
        current: &CachePayload<T>,
        update: F,
    ) -> Result<(CachePayload<T>, V)>
    where
        F: FnOnce(T) -> (T, V),
    {
        let (value, result) = update(current.value.clone());

        let bytes = value.to_bytes().map_err(|source| CacheError::Serialization {
            key: self.name.clone(),
            source,
            recovery_hint: RecoveryHint::Manual {
                instructions: "Check that the record type can be encoded".to_string(),
            },
        })?;

        if let Some(parent) = self.cache_file.parent() {
            fs::create_dir_all(parent).await.map_err(|e| CacheError::DiskWrite {
                path: parent.to_path_buf(),
                operation: "create cache directory",
                recovery_hint: write_recovery_hint(&e, parent),
                source: e,
            })?;
        }

        if let Err(e) = fs::write(&self.cache_file, &bytes).await {
            warn!(cache = %self.name, path = %self.cache_file.display(), error = %e, "failed to write cache file");
            return Err(CacheError::DiskWrite {
                path: self.cache_file.clone(),
                operation: "write cache file",
                recovery_hint: write_recovery_hint(&e, &self.cache_file),
                source: e,
            });
        }

        self.clear_failure();
        debug!(cache = %self.name, bytes = bytes.len(), "stored cache file");
        Ok((CachePayload::new(CacheState::InMemoryAndOnDisk, value), result))
    }

    /// Remove the backing file; a file that is already gone is not an error
    pub(super) async fn delete_file_cache(&self) -> Result<()> {
        match fs::remove_file(&self.cache_file).await {
            Ok(()) => {
                debug!(cache = %self.name, "deleted cache file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::DiskWrite {
                path: self.cache_file.clone(),
                operation: "delete cache file",
                recovery_hint: write_recovery_hint(&e, &self.cache_file),
                source: e,
            }),
        }
    }
}
