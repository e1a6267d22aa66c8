//! Store configuration with precedence tracking
use stashbox_utils::XdgPaths;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the base directory for record files
pub const CACHE_DIR_ENV: &str = "STASHBOX_CACHE_DIR";

/// Extension given to every backing file
pub const CACHE_FILE_EXTENSION: &str = "cache";

/// Where record stores keep their files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory for stores shared by the whole process
    pub root_dir: PathBuf,
    /// Directory under which each namespace gets its own subdirectory
    pub namespace_root: PathBuf,
    /// Configuration source for debugging
    pub source: ConfigSource,
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Default configuration
    Default,
    /// Environment variable
    EnvironmentVariable(String),
    /// Set explicitly by the embedding application
    Explicit,
}

impl Default for StoreConfig {
    fn default() -> Self {
        // Use XDG cache directory which respects XDG_CACHE_HOME
        Self {
            root_dir: XdgPaths::records_dir(),
            namespace_root: XdgPaths::namespaces_dir(),
            source: ConfigSource::Default,
        }
    }
}

impl StoreConfig {
    /// Lay out shared and namespaced stores under one base directory
    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref();
        Self {
            root_dir: base_dir.join("records"),
            namespace_root: base_dir.join("namespaces"),
            source: ConfigSource::Explicit,
        }
    }

    /// Defaults, overridden by `STASHBOX_CACHE_DIR` when it is set
    pub fn from_env() -> Self {
        match env::var(CACHE_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self {
                source: ConfigSource::EnvironmentVariable(CACHE_DIR_ENV.to_string()),
                ..Self::with_base_dir(dir)
            },
            _ => Self::default(),
        }
    }

    pub fn root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self.source = ConfigSource::Explicit;
        self
    }

    pub fn namespace_root(mut self, namespace_root: impl Into<PathBuf>) -> Self {
        self.namespace_root = namespace_root.into();
        self.source = ConfigSource::Explicit;
        self
    }

    /// File name for the store called `name`
    pub fn cache_file_name(name: &str) -> String {
        format!("{name}.{CACHE_FILE_EXTENSION}")
    }
}
