//! Namespace directory resolution
//!
//! Stores that belong to a single tenant (a user profile, a workspace) live
//! in their own subdirectory so that two tenants never share a backing file.
//! The resolver is injected into whatever builds the stores; nothing here
//! touches process-global state.

use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while resolving a namespace directory
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("invalid namespace key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("failed to create namespace directory '{}'", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Maps a namespace key to a directory, creating it when absent
pub trait DirectoryResolver: Send + Sync {
    /// Return the directory for `namespace_key`, creating it if needed
    fn namespace_dir(&self, namespace_key: &str) -> Result<PathBuf, DirectoryError>;
}

/// Resolves namespaces to `<root>/<key>` on the local file system
#[derive(Debug, Clone)]
pub struct NamespaceDirectories {
    root: PathBuf,
}

impl NamespaceDirectories {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DirectoryResolver for NamespaceDirectories {
    fn namespace_dir(&self, namespace_key: &str) -> Result<PathBuf, DirectoryError> {
        validate_path_component(namespace_key).map_err(|reason| DirectoryError::InvalidKey {
            key: namespace_key.to_string(),
            reason,
        })?;

        let dir = self.root.join(namespace_key);
        fs::create_dir_all(&dir).map_err(|source| DirectoryError::Create {
            path: dir.clone(),
            source,
        })?;

        tracing::trace!(namespace = namespace_key, dir = %dir.display(), "resolved namespace directory");
        Ok(dir)
    }
}

/// Check that `component` names exactly one entry inside a directory
///
/// Rejects empty strings, `.` and `..`, and anything containing a path
/// separator or NUL byte.
pub fn validate_path_component(component: &str) -> Result<(), &'static str> {
    if component.is_empty() {
        return Err("must not be empty");
    }
    if component == "." || component == ".." {
        return Err("must not be a relative directory reference");
    }
    if component.contains(['/', '\\', '\0']) {
        return Err("must not contain path separators");
    }
    Ok(())
}
