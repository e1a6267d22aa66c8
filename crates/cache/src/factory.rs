//! Store construction
//!
//! The factory binds stores to files. Shared stores live directly under the
//! configured root; namespaced stores live in a per-namespace directory
//! obtained from the injected `DirectoryResolver`.

use crate::config::StoreConfig;
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::notify::{ChangeNotifier, ProviderId};
use crate::record::CacheRecord;
use crate::store::PersistentStore;
use stashbox_utils::{validate_path_component, DirectoryResolver, NamespaceDirectories};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;

/// Builds `PersistentStore`s that share a root, a notifier, and a runtime
#[derive(Clone)]
pub struct StoreFactory {
    config: StoreConfig,
    notifier: Arc<dyn ChangeNotifier>,
    resolver: Arc<dyn DirectoryResolver>,
    runtime: Handle,
}

impl StoreFactory {
    /// Create a factory on the current tokio runtime
    pub fn new(
        config: StoreConfig,
        notifier: Arc<dyn ChangeNotifier>,
        resolver: Arc<dyn DirectoryResolver>,
    ) -> Result<Self> {
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                return Err(CacheError::Configuration {
                    message: format!("store factory needs a tokio runtime: {e}"),
                    recovery_hint: RecoveryHint::Manual {
                        instructions: "Create the factory from within a tokio runtime or use with_runtime"
                            .to_string(),
                    },
                });
            }
        };
        Ok(Self::with_runtime(config, notifier, resolver, runtime))
    }

    /// Create a factory whose namespaces live under `config.namespace_root`
    pub fn from_config(config: StoreConfig, notifier: Arc<dyn ChangeNotifier>) -> Result<Self> {
        let resolver = Arc::new(NamespaceDirectories::new(config.namespace_root.clone()));
        Self::new(config, notifier, resolver)
    }

    /// Create a factory that spawns store queues on `runtime`
    pub fn with_runtime(
        config: StoreConfig,
        notifier: Arc<dyn ChangeNotifier>,
        resolver: Arc<dyn DirectoryResolver>,
        runtime: Handle,
    ) -> Self {
        Self {
            config,
            notifier,
            resolver,
            runtime,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Store bound to `<root>/<name>.cache`
    pub fn create<T: CacheRecord>(&self, name: &str, initial: T) -> Result<PersistentStore<T>> {
        validate_name(name)?;
        let cache_file = self.config.root_dir.join(StoreConfig::cache_file_name(name));
        let provider_id = ProviderId::for_cache_file(&cache_file, None);
        Ok(self.bind(name, &cache_file, initial, provider_id))
    }

    /// Store bound to `<namespace dir>/<name>.cache`, creating the
    /// namespace directory if needed
    pub fn create_per_namespace<T: CacheRecord>(
        &self,
        name: &str,
        initial: T,
        namespace_key: &str,
    ) -> Result<PersistentStore<T>> {
        validate_name(name)?;
        let directory = self.resolver.namespace_dir(namespace_key)?;
        let cache_file = directory.join(StoreConfig::cache_file_name(name));
        let provider_id = ProviderId::for_cache_file(&cache_file, Some(namespace_key));
        Ok(self.bind(name, &cache_file, initial, provider_id))
    }

    fn bind<T: CacheRecord>(
        &self,
        name: &str,
        cache_file: &Path,
        initial: T,
        provider_id: ProviderId,
    ) -> PersistentStore<T> {
        debug!(cache = name, path = %cache_file.display(), provider = %provider_id, "creating store");
        PersistentStore::new(
            &self.runtime,
            name,
            cache_file.to_path_buf(),
            initial,
            provider_id,
            Arc::clone(&self.notifier),
        )
    }
}

impl std::fmt::Debug for StoreFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreFactory")
            .field("config", &self.config)
            .finish()
    }
}

fn validate_name(name: &str) -> Result<()> {
    validate_path_component(name).map_err(|reason| CacheError::invalid_name(name, reason))
}
