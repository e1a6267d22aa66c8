//! Change notifications for record stores
//!
//! Stores only know how to say "the record behind this id changed". Who
//! listens and how delivery works belongs to the notifier.

use std::fmt;
use std::path::Path;
use tokio::sync::broadcast;
use tracing::debug;

/// Address used when announcing that a store's record changed
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id for a backing file, optionally scoped to a namespace
    pub fn for_cache_file(cache_file: &Path, namespace: Option<&str>) -> Self {
        let file_name = cache_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        match namespace {
            Some(namespace) => Self(format!("{namespace}/{file_name}")),
            None => Self(file_name),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Receives change notifications from stores
pub trait ChangeNotifier: Send + Sync {
    fn notify_change(&self, id: &ProviderId);
}

/// Notifier that drops every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn notify_change(&self, _id: &ProviderId) {}
}

/// Fans notifications out to every subscriber over a broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<ProviderId>,
}

impl BroadcastNotifier {
    /// Create a notifier whose subscribers can lag by up to `capacity` ids
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProviderId> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn notify_change(&self, id: &ProviderId) {
        if let Err(e) = self.sender.send(id.clone()) {
            debug!("No subscribers for change to {}: {}", id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_provider_id_from_file_name() {
        let path = PathBuf::from("/var/cache/stashbox/records/counters.cache");
        assert_eq!(ProviderId::for_cache_file(&path, None).as_str(), "counters.cache");
        assert_eq!(
            ProviderId::for_cache_file(&path, Some("profile-1")).as_str(),
            "profile-1/counters.cache"
        );
    }

    #[tokio::test]
    async fn test_broadcast_delivers_to_every_subscriber() {
        let notifier = BroadcastNotifier::new(8);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        notifier.notify_change(&ProviderId::new("a.cache"));

        assert_eq!(first.recv().await.unwrap(), ProviderId::new("a.cache"));
        assert_eq!(second.recv().await.unwrap(), ProviderId::new("a.cache"));
        assert_eq!(notifier.subscriber_count(), 2);
    }

    #[test]
    fn test_broadcast_without_subscribers_does_not_panic() {
        BroadcastNotifier::default().notify_change(&ProviderId::new("a.cache"));
        NoopNotifier.notify_change(&ProviderId::new("a.cache"));
    }

    #[tokio::test]
    async fn test_zero_capacity_notifier_still_delivers() {
        let notifier = BroadcastNotifier::new(0);
        let mut rx = notifier.subscribe();

        notifier.notify_change(&ProviderId::new("z.cache"));

        assert_eq!(rx.recv().await.unwrap(), ProviderId::new("z.cache"));
    }
}
