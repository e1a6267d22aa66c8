use std::env;
use std::path::PathBuf;

/// XDG Base Directory paths for stashbox
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CACHE_HOME/stashbox or fallback
    pub fn cache_dir() -> PathBuf {
        env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".cache"))
                    .unwrap_or_else(|| PathBuf::from(".cache"))
            })
            .join("stashbox")
    }

    /// Get the shared root that holds record files not scoped to a namespace
    pub fn records_dir() -> PathBuf {
        Self::cache_dir().join("records")
    }

    /// Get the root under which per-namespace record directories live
    pub fn namespaces_dir() -> PathBuf {
        Self::cache_dir().join("namespaces")
    }
}
