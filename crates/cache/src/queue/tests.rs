//! Tests for the update queue

use super::UpdateQueue;
use crate::errors::{CacheError, RecoveryHint};
use crate::notify::{ChangeNotifier, ProviderId};
use crate::payload::{CachePayload, CacheState};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

#[derive(Default)]
struct RecordingNotifier {
    seen: Mutex<Vec<ProviderId>>,
}

impl RecordingNotifier {
    fn count(&self) -> usize {
        self.seen.lock().len()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn notify_change(&self, id: &ProviderId) {
        self.seen.lock().push(id.clone());
    }
}

fn queue_with<T: crate::record::CacheRecord>(
    initial: CachePayload<T>,
) -> (UpdateQueue<T>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let queue = UpdateQueue::spawn(
        &Handle::current(),
        initial,
        ProviderId::new("test.cache"),
        notifier.clone(),
    );
    (queue, notifier)
}

fn loaded<T>(value: T) -> CachePayload<T> {
    CachePayload::new(CacheState::InMemoryAndOnDisk, value)
}

#[tokio::test]
async fn test_read_if_present_returns_current_payload() {
    let (queue, notifier) = queue_with(CachePayload::unloaded(3i64));

    let payload = queue.read_if_present().await.unwrap();

    assert_eq!(payload, CachePayload::unloaded(3));
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn test_updates_run_in_submission_order() {
    let (queue, _) = queue_with(loaded(Vec::<String>::new()));

    // Earlier submissions sleep longer; order must still follow submission.
    let pending: Vec<_> = (0..5u64)
        .map(|i| {
            queue.update_if_present(move |mut payload: CachePayload<Vec<String>>| async move {
                tokio::time::sleep(Duration::from_millis(25 - i * 5)).await;
                payload.value.push(format!("marker-{i}"));
                Ok(payload)
            })
        })
        .collect();

    for update in pending {
        update.await.unwrap();
    }

    let final_value = queue.read_if_present().await.unwrap().value;
    let expected: Vec<String> = (0..5).map(|i| format!("marker-{i}")).collect();
    assert_eq!(final_value, expected);
}

#[tokio::test]
async fn test_submission_happens_at_call_time_not_first_poll() {
    let (queue, _) = queue_with(loaded(Vec::<u32>::new()));

    let first = queue.update_if_present(|mut payload: CachePayload<Vec<u32>>| async move {
        payload.value.push(1);
        Ok(payload)
    });
    let second = queue.update_if_present(|mut payload: CachePayload<Vec<u32>>| async move {
        payload.value.push(2);
        Ok(payload)
    });

    // Await in reverse; the second still observes the first's write.
    let after_second = second.await.unwrap();
    let after_first = first.await.unwrap();

    assert_eq!(after_first.value, vec![1]);
    assert_eq!(after_second.value, vec![1, 2]);
}

#[tokio::test]
async fn test_dropped_future_still_applies_update() {
    let (queue, _) = queue_with(loaded(0i64));

    drop(queue.update_if_present(|payload: CachePayload<i64>| async move {
        Ok(CachePayload::new(payload.state, payload.value + 1))
    }));

    assert_eq!(queue.read_if_present().await.unwrap().value, 1);
}

#[tokio::test]
async fn test_custom_result_is_separate_from_payload() {
    let (queue, _) = queue_with(loaded(10i64));

    let previous = queue
        .update_with_custom_result(|payload: CachePayload<i64>| async move {
            let old = payload.value;
            Ok((CachePayload::new(payload.state, old * 2), old))
        })
        .await
        .unwrap();

    assert_eq!(previous, 10);
    assert_eq!(queue.read_if_present().await.unwrap().value, 20);
}

#[tokio::test]
async fn test_notifies_only_on_visible_change() {
    let (queue, notifier) = queue_with(CachePayload::unloaded(0i64));

    // Leaving Unloaded notifies even with the same value.
    queue
        .update_if_present(|payload: CachePayload<i64>| async move {
            Ok(payload.with_state(CacheState::InMemoryOnly))
        })
        .await
        .unwrap();
    assert_eq!(notifier.count(), 1);

    // State churn with the same value does not.
    queue
        .update_if_present(|payload: CachePayload<i64>| async move {
            Ok(payload.with_state(CacheState::InMemoryAndOnDisk))
        })
        .await
        .unwrap();
    assert_eq!(notifier.count(), 1);

    // A value change does.
    queue
        .update_if_present(|payload: CachePayload<i64>| async move {
            Ok(CachePayload::new(payload.state, 7))
        })
        .await
        .unwrap();
    assert_eq!(notifier.count(), 2);
    assert_eq!(notifier.seen.lock()[0], ProviderId::new("test.cache"));
}

#[tokio::test]
async fn test_reset_always_notifies() {
    let (queue, notifier) = queue_with(CachePayload::unloaded(0i64));

    queue
        .reset(|_payload: CachePayload<i64>| async move { Ok((CachePayload::unloaded(0), ())) })
        .await
        .unwrap();

    assert_eq!(notifier.count(), 1);
}

#[tokio::test]
async fn test_failed_transform_leaves_payload_untouched() {
    let (queue, notifier) = queue_with(loaded(4i64));

    let result = queue
        .update_if_present(|_payload: CachePayload<i64>| async move {
            Err(CacheError::Configuration {
                message: "boom".to_string(),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            })
        })
        .await;

    assert!(matches!(result, Err(CacheError::Configuration { .. })));
    assert_eq!(queue.read_if_present().await.unwrap(), loaded(4));
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn test_panicking_transform_does_not_stop_the_queue() {
    let (queue, _) = queue_with(loaded(1i64));

    let result = queue
        .update_if_present(|_payload: CachePayload<i64>| async move {
            if true {
                panic!("transform exploded");
            }
            Ok(loaded(0))
        })
        .await;

    match result {
        Err(error @ CacheError::StoreUnavailable { .. }) => {
            let message = error.to_string();
            assert!(message.contains("panicked"), "{message}");
            assert!(!message.contains("no longer running"), "{message}");
        }
        other => panic!("expected StoreUnavailable, got {other:?}"),
    }
    assert_eq!(queue.read_if_present().await.unwrap().value, 1);
}

#[tokio::test]
async fn test_transform_panicking_before_its_future_is_contained() {
    let (queue, notifier) = queue_with(loaded(3i64));

    let result = queue
        .update_if_present(|_payload: CachePayload<i64>| -> std::future::Ready<crate::errors::Result<CachePayload<i64>>> {
            panic!("transform exploded while building its future")
        })
        .await;

    assert!(matches!(result, Err(CacheError::StoreUnavailable { .. })));
    assert_eq!(queue.read_if_present().await.unwrap().value, 3);
    assert_eq!(notifier.count(), 0);
}

#[test]
fn test_closed_queue_reports_unavailable() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let queue = UpdateQueue::spawn(
        runtime.handle(),
        loaded(0i64),
        ProviderId::new("closed.cache"),
        Arc::new(RecordingNotifier::default()),
    );
    drop(runtime);

    let other = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let result = other.block_on(queue.read_if_present());

    assert!(matches!(result, Err(CacheError::StoreUnavailable { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_separate_queues_progress_independently() {
    let (slow, _) = queue_with(loaded(0i64));
    let (fast, _) = queue_with(loaded(0i64));

    let (gate_tx, gate_rx) = tokio::sync::oneshot::channel::<()>();
    let blocked = slow.update_if_present(|payload: CachePayload<i64>| async move {
        let _ = gate_rx.await;
        Ok(CachePayload::new(payload.state, 1))
    });

    // The other queue is not held up by the blocked one.
    let value = tokio::time::timeout(Duration::from_secs(1), fast.read_if_present())
        .await
        .expect("independent queue should not wait")
        .unwrap()
        .value;
    assert_eq!(value, 0);

    gate_tx.send(()).unwrap();
    assert_eq!(blocked.await.unwrap().value, 1);
}

mod fifo_property {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn markers_appear_in_submission_order(delays in prop::collection::vec(0u64..4, 1..16)) {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();

            let final_value = runtime.block_on(async {
                let (queue, _) = queue_with(loaded(Vec::<usize>::new()));
                let pending: Vec<_> = delays
                    .iter()
                    .enumerate()
                    .map(|(i, delay)| {
                        let delay = *delay;
                        queue.update_if_present(move |mut payload: CachePayload<Vec<usize>>| async move {
                            tokio::time::sleep(Duration::from_millis(delay)).await;
                            payload.value.push(i);
                            Ok(payload)
                        })
                    })
                    .collect();
                futures::future::join_all(pending).await;
                queue.read_if_present().await.unwrap().value
            });

            prop_assert_eq!(final_value, (0..delays.len()).collect::<Vec<_>>());
        }
    }
}
