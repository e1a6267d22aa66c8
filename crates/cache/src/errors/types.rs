//! Core error types for the record store

use std::path::PathBuf;
use std::time::Duration;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Boxed error produced by a record codec
pub type RecordError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for record store operations
#[derive(Debug)]
pub enum CacheError {
    /// Backing file exists but could not be read or parsed
    DiskRead {
        path: PathBuf,
        source: RecordError,
        recovery_hint: RecoveryHint,
    },

    /// I/O error while overwriting or deleting the backing file
    DiskWrite {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },

    /// Record could not be encoded
    Serialization {
        key: String,
        source: RecordError,
        recovery_hint: RecoveryHint,
    },

    /// The update queue behind a store stopped accepting work
    StoreUnavailable {
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// Invalid store name, namespace, or runtime setup
    Configuration {
        message: String,
        recovery_hint: RecoveryHint,
    },

    /// Namespace directory could not be resolved
    Directory {
        source: stashbox_utils::DirectoryError,
        recovery_hint: RecoveryHint,
    },
}

/// Recovery hints for error handling
#[derive(Debug, Clone)]
pub enum RecoveryHint {
    /// Retry the operation
    Retry { after: Duration },

    /// Clear the cache and retry
    ClearAndRetry,

    /// Check file permissions
    CheckPermissions { path: PathBuf },

    /// Check disk space and clean up if needed
    CheckDiskSpace,

    /// Recreate cache file/directory
    Recreate,

    /// Update cache configuration
    UpdateConfiguration,

    /// No automated recovery possible
    Manual { instructions: String },
}

impl CacheError {
    /// Recovery hint attached to this error
    pub fn recovery_hint(&self) -> &RecoveryHint {
        match self {
            Self::DiskRead { recovery_hint, .. }
            | Self::DiskWrite { recovery_hint, .. }
            | Self::Serialization { recovery_hint, .. }
            | Self::StoreUnavailable { recovery_hint, .. }
            | Self::Configuration { recovery_hint, .. }
            | Self::Directory { recovery_hint, .. } => recovery_hint,
        }
    }

    /// True for failures to read or parse the backing file
    pub fn is_disk_read(&self) -> bool {
        matches!(self, Self::DiskRead { .. })
    }

    /// True for failures to write or delete the backing file
    pub fn is_disk_write(&self) -> bool {
        matches!(self, Self::DiskWrite { .. } | Self::Serialization { .. })
    }

    pub(crate) fn queue_closed(name: &str) -> Self {
        Self::StoreUnavailable {
            reason: format!("update queue for '{name}' is no longer running"),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Recreate the store from a running tokio runtime".to_string(),
            },
        }
    }

    pub(crate) fn transform_panicked(name: &str) -> Self {
        Self::StoreUnavailable {
            reason: format!("update transform for '{name}' panicked; the previous payload was kept"),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Fix the update closure; the store is still usable".to_string(),
            },
        }
    }

    pub(crate) fn invalid_name(name: &str, reason: &str) -> Self {
        Self::Configuration {
            message: format!("invalid cache name '{name}': {reason}"),
            recovery_hint: RecoveryHint::UpdateConfiguration,
        }
    }
}
