//! Error conversion utilities

use super::types::{CacheError, RecoveryHint};
use stashbox_utils::DirectoryError;

impl From<DirectoryError> for CacheError {
    fn from(error: DirectoryError) -> Self {
        let recovery_hint = match &error {
            DirectoryError::InvalidKey { .. } => RecoveryHint::UpdateConfiguration,
            DirectoryError::Create { path, .. } => RecoveryHint::CheckPermissions { path: path.clone() },
        };

        Self::Directory {
            source: error,
            recovery_hint,
        }
    }
}

/// Pick a recovery hint for a failed write to `path`
pub(crate) fn write_recovery_hint(error: &std::io::Error, path: &std::path::Path) -> RecoveryHint {
    use std::io::ErrorKind;

    match error.kind() {
        ErrorKind::PermissionDenied => RecoveryHint::CheckPermissions {
            path: path.to_path_buf(),
        },
        ErrorKind::NotFound => RecoveryHint::Recreate,
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => RecoveryHint::Retry {
            after: std::time::Duration::from_millis(100),
        },
        _ => RecoveryHint::CheckDiskSpace,
    }
}
