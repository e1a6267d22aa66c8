//! Display implementations for cache errors

use super::types::CacheError;
use std::fmt;

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiskRead { path, source, .. } => write!(
                f,
                "Failed to read cache file '{}': {}",
                path.display(),
                source
            ),
            Self::DiskWrite {
                path,
                operation,
                source,
                ..
            } => write!(
                f,
                "I/O error during {} on '{}': {}",
                operation,
                path.display(),
                source
            ),
            Self::Serialization { key, source, .. } => {
                write!(f, "Failed to encode cache record '{key}': {source}")
            }
            Self::StoreUnavailable { reason, .. } => write!(f, "Cache store unavailable: {reason}"),
            Self::Configuration { message, .. } => {
                write!(f, "Cache configuration error: {message}")
            }
            Self::Directory { source, .. } => write!(f, "Cache directory error: {source}"),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DiskRead { source, .. } => Some(source.as_ref()),
            Self::DiskWrite { source, .. } => Some(source),
            Self::Serialization { source, .. } => Some(source.as_ref()),
            Self::Directory { source, .. } => Some(source),
            Self::StoreUnavailable { .. } | Self::Configuration { .. } => None,
        }
    }
}
