//! Single-writer update queue
//!
//! Each queue owns one `CachePayload` and one consumer task on the tokio
//! runtime. Transforms are submitted as messages and run strictly one at a
//! time in submission order; a transform's file I/O finishes before the next
//! transform sees the payload. Different queues drain independently. A
//! transform that panics fails only its own call.
//!
//! Work is enqueued when an operation is called, not when its future is
//! first polled, so call order is execution order. Dropping the returned
//! future does not cancel the queued transform.

use crate::errors::{CacheError, Result};
use crate::notify::{ChangeNotifier, ProviderId};
use crate::payload::CachePayload;
use crate::record::CacheRecord;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, trace};

#[cfg(test)]
mod tests;

type Reply = Box<dyn FnOnce() + Send>;
type Job<T> = Box<dyn FnOnce(CachePayload<T>) -> BoxFuture<'static, Outcome<T>> + Send>;

/// What a finished job hands back to the consumer loop
struct Outcome<T> {
    /// New payload, or `None` when the transform failed
    commit: Option<CachePayload<T>>,
    notify: NotifyPolicy,
    /// Completes the caller's future; invoked after commit and notification
    reply: Reply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotifyPolicy {
    IfVisible,
    Always,
}

/// Serializes every read and write against one cache payload
pub struct UpdateQueue<T> {
    sender: mpsc::UnboundedSender<Job<T>>,
    provider_id: ProviderId,
}

impl<T> Clone for UpdateQueue<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            provider_id: self.provider_id.clone(),
        }
    }
}

impl<T> std::fmt::Debug for UpdateQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("provider_id", &self.provider_id)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl<T> UpdateQueue<T> {
    pub fn provider_id(&self) -> &ProviderId {
        &self.provider_id
    }
}

impl<T: CacheRecord> UpdateQueue<T> {
    /// Start a queue holding `initial`, draining on `runtime`
    pub fn spawn(
        runtime: &Handle,
        initial: CachePayload<T>,
        provider_id: ProviderId,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        runtime.spawn(drain(receiver, initial, provider_id.clone(), notifier));
        debug!(provider = %provider_id, "update queue started");
        Self {
            sender,
            provider_id,
        }
    }

    /// Current payload, ordered after everything submitted before it
    pub fn read_if_present(&self) -> impl Future<Output = Result<CachePayload<T>>> + Send + 'static {
        self.update_with_custom_result(|payload| async move {
            let snapshot = payload.clone();
            Ok((payload, snapshot))
        })
    }

    /// Replace the payload with the transform's output and return it
    pub fn update_if_present<F, Fut>(
        &self,
        transform: F,
    ) -> impl Future<Output = Result<CachePayload<T>>> + Send + 'static
    where
        F: FnOnce(CachePayload<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<CachePayload<T>>> + Send + 'static,
    {
        self.update_with_custom_result(move |payload| async move {
            let next = transform(payload).await?;
            let result = next.clone();
            Ok::<_, CacheError>((next, result))
        })
    }

    /// Replace the payload and hand the caller a separate result
    ///
    /// If the transform fails the payload is left as it was and only this
    /// call's future sees the error.
    pub fn update_with_custom_result<V, F, Fut>(
        &self,
        transform: F,
    ) -> impl Future<Output = Result<V>> + Send + 'static
    where
        V: Send + 'static,
        F: FnOnce(CachePayload<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(CachePayload<T>, V)>> + Send + 'static,
    {
        self.submit(NotifyPolicy::IfVisible, transform)
    }

    /// Like `update_with_custom_result`, but subscribers are notified on
    /// success even when nothing visibly changed
    pub(crate) fn reset<V, F, Fut>(&self, transform: F) -> impl Future<Output = Result<V>> + Send + 'static
    where
        V: Send + 'static,
        F: FnOnce(CachePayload<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(CachePayload<T>, V)>> + Send + 'static,
    {
        self.submit(NotifyPolicy::Always, transform)
    }

    fn submit<V, F, Fut>(
        &self,
        notify: NotifyPolicy,
        transform: F,
    ) -> impl Future<Output = Result<V>> + Send + 'static
    where
        V: Send + 'static,
        F: FnOnce(CachePayload<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(CachePayload<T>, V)>> + Send + 'static,
    {
        let (reply_to, response) = oneshot::channel::<Result<V>>();

        let job_provider = self.provider_id.clone();
        let job: Job<T> = Box::new(move |payload| {
            async move {
                // Calling the transform inside the block keeps a synchronous
                // panic within `catch_unwind` too.
                let run = AssertUnwindSafe(async move { transform(payload).await });
                let (commit, result) = match run.catch_unwind().await {
                    Ok(Ok((next, value))) => (Some(next), Ok(value)),
                    Ok(Err(e)) => (None, Err(e)),
                    Err(_) => {
                        error!(provider = %job_provider, "cache transform panicked, keeping previous payload");
                        (None, Err(CacheError::transform_panicked(job_provider.as_str())))
                    }
                };
                Outcome {
                    commit,
                    notify,
                    reply: Box::new(move || {
                        // The caller may have stopped waiting; the update stands either way.
                        let _ = reply_to.send(result);
                    }),
                }
            }
            .boxed()
        });

        let submitted = self.sender.send(job).map_err(|_| ());
        let provider_id = self.provider_id.clone();

        async move {
            if submitted.is_err() {
                return Err(CacheError::queue_closed(provider_id.as_str()));
            }
            match response.await {
                Ok(result) => result,
                Err(_) => Err(CacheError::queue_closed(provider_id.as_str())),
            }
        }
    }
}

async fn drain<T: CacheRecord>(
    mut jobs: mpsc::UnboundedReceiver<Job<T>>,
    mut payload: CachePayload<T>,
    provider_id: ProviderId,
    notifier: Arc<dyn ChangeNotifier>,
) {
    while let Some(job) = jobs.recv().await {
        let outcome = job(payload.clone()).await;

        if let Some(next) = outcome.commit {
            let visible = match outcome.notify {
                NotifyPolicy::Always => true,
                NotifyPolicy::IfVisible => payload.differs_visibly_from(&next),
            };
            trace!(
                provider = %provider_id,
                from = ?payload.state,
                to = ?next.state,
                visible,
                "committed cache payload"
            );
            payload = next;
            if visible {
                notifier.notify_change(&provider_id);
            }
        }

        (outcome.reply)();
    }

    debug!(provider = %provider_id, "update queue closed");
}
