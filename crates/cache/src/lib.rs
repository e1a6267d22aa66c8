//! Persistent structured-record cache for stashbox
//!
//! This crate keeps one typed record per logical cache, in memory and in a
//! single file on disk:
//! - A single-writer update queue per store serializes every read and write
//! - Loads merge on-disk bytes into the in-memory value
//! - Corrupt files degrade to in-memory operation with a sticky failure
//! - Priming separates first-time initialization from re-validation
//! - Namespaced stores give each tenant its own directory

pub mod config;
pub mod errors;
pub mod factory;
pub mod notify;
pub mod payload;
pub mod queue;
pub mod record;
pub mod store;

pub use config::{ConfigSource, StoreConfig};
pub use errors::{CacheError, RecoveryHint, Result};
pub use factory::StoreFactory;
pub use notify::{BroadcastNotifier, ChangeNotifier, NoopNotifier, ProviderId};
pub use payload::{AsyncResult, CachePayload, CacheState};
pub use queue::UpdateQueue;
pub use record::CacheRecord;
pub use store::{PersistentStore, PublishMode, UpdateMode};
