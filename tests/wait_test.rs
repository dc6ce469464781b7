/*!
 * Wait/Notify Tests
 * Synchronous wait engine, notifier ordering, and timeout races
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use waitq::{ElementKind, FutexManager, SharedBlock, SharedView, WaitOutcome};

const WAITER_COUNT: usize = 10;

fn shared_i32_view(len_bytes: usize) -> SharedView {
    let block = SharedBlock::new_shared(len_bytes).unwrap();
    SharedView::full(block, ElementKind::Int32).unwrap()
}

/// Poll a condition with a hard cap so a broken wakeup fails fast
fn wait_until<F: Fn() -> bool>(what: &str, cond: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn test_fifo_wake_order_ten_waiters() {
    let _ = env_logger::builder().is_test(true).try_init();

    let manager = FutexManager::new();
    let view = shared_i32_view(16);
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for i in 0..WAITER_COUNT {
        let m = manager.clone();
        let v = view.clone();
        let woken = Arc::clone(&order);
        handles.push(thread::spawn(move || {
            let outcome = m.wait(&v, 0, 0, None).unwrap();
            assert_eq!(outcome, WaitOutcome::Ok);
            woken.lock().unwrap().push(i);
        }));

        // Gate on the diagnostic so arrival order is deterministic
        wait_until("waiter enqueued", || {
            manager.waiter_list_size(&view, 0).unwrap() == i + 1
        });
    }

    // Ten single-count notifies wake the waiters strictly in arrival order
    for i in 0..WAITER_COUNT {
        assert_eq!(manager.notify(&view, 0, 1).unwrap(), 1);
        wait_until("waiter woken", || order.lock().unwrap().len() == i + 1);
        assert_eq!(*order.lock().unwrap(), (0..=i).collect::<Vec<_>>());
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(manager.waiter_list_size(&view, 0).unwrap(), 0);
}

#[test]
fn test_mismatch_short_circuits() {
    let manager = FutexManager::new();
    let view = shared_i32_view(16);
    view.store(2, 41).unwrap();

    let outcome = manager.wait(&view, 2, 40, None).unwrap();
    assert_eq!(outcome, WaitOutcome::NotEqual);
    assert_eq!(outcome.as_str(), "not-equal");
    assert_eq!(manager.waiter_list_size(&view, 2).unwrap(), 0);
    assert_eq!(manager.stats().locations, 0);
}

#[test]
fn test_notify_count_saturation() {
    let manager = FutexManager::new();
    let view = shared_i32_view(16);

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let m = manager.clone();
            let v = view.clone();
            thread::spawn(move || m.wait(&v, 0, 0, None).unwrap())
        })
        .collect();
    wait_until("all waiters enqueued", || {
        manager.waiter_list_size(&view, 0).unwrap() == 3
    });

    // Asking for more than are queued wakes only the actual number
    assert_eq!(manager.notify(&view, 0, 100).unwrap(), 3);
    for handle in handles {
        assert_eq!(handle.join().unwrap(), WaitOutcome::Ok);
    }
    assert_eq!(manager.waiter_list_size(&view, 0).unwrap(), 0);
}

#[test]
fn test_empty_location_notify() {
    let manager = FutexManager::new();
    let view = shared_i32_view(16);

    assert_eq!(manager.notify(&view, 1, 5).unwrap(), 0);
    assert_eq!(manager.notify_all(&view, 1).unwrap(), 0);
    // No list is created by notifying an idle location
    assert_eq!(manager.stats().locations, 0);
}

#[test]
fn test_timeout_with_matching_value() {
    let manager = FutexManager::new();
    let view = shared_i32_view(16);

    let start = Instant::now();
    let outcome = manager
        .wait(&view, 0, 0, Some(Duration::from_millis(50)))
        .unwrap();
    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert!(start.elapsed() >= Duration::from_millis(50));

    // The timed-out waiter removed itself and its list
    assert_eq!(manager.waiter_list_size(&view, 0).unwrap(), 0);
    assert_eq!(manager.stats().locations, 0);
}

#[test]
fn test_timeout_notify_mutual_exclusion() {
    let manager = FutexManager::new();
    let view = shared_i32_view(16);

    for _ in 0..50 {
        let m = manager.clone();
        let v = view.clone();
        let waiter =
            thread::spawn(move || m.wait(&v, 3, 0, Some(Duration::from_millis(5))).unwrap());

        // Race the timeout against a notify landing around the same moment
        thread::sleep(Duration::from_millis(5));
        let woken = manager.notify(&view, 3, 1).unwrap();
        let outcome = waiter.join().unwrap();

        // Exactly one path resolved the waiter, and each counted it once
        match outcome {
            WaitOutcome::Ok => assert_eq!(woken, 1),
            WaitOutcome::TimedOut => assert_eq!(woken, 0),
            WaitOutcome::NotEqual => panic!("value always matches in this test"),
        }
        assert_eq!(manager.waiter_list_size(&view, 3).unwrap(), 0);
    }
    assert_eq!(manager.stats().locations, 0);
}

#[test]
fn test_independent_locations() {
    let manager = FutexManager::new();
    let view = shared_i32_view(16);

    let handle = {
        let m = manager.clone();
        let v = view.clone();
        thread::spawn(move || m.wait(&v, 0, 0, None).unwrap())
    };
    wait_until("waiter enqueued", || {
        manager.waiter_list_size(&view, 0).unwrap() == 1
    });

    // A notify at a different element of the same block wakes nothing
    assert_eq!(manager.notify_all(&view, 1).unwrap(), 0);
    assert_eq!(manager.waiter_list_size(&view, 0).unwrap(), 1);

    assert_eq!(manager.notify_all(&view, 0).unwrap(), 1);
    assert_eq!(handle.join().unwrap(), WaitOutcome::Ok);
}

#[test]
fn test_end_to_end_two_waiters() {
    let manager = FutexManager::new();
    let view = shared_i32_view(16);

    let first = {
        let m = manager.clone();
        let v = view.clone();
        thread::spawn(move || m.wait(&v, 0, 0, None).unwrap())
    };
    wait_until("first waiter", || {
        manager.waiter_list_size(&view, 0).unwrap() == 1
    });

    let second = {
        let m = manager.clone();
        let v = view.clone();
        thread::spawn(move || m.wait(&v, 0, 0, None).unwrap())
    };
    wait_until("second waiter", || {
        manager.waiter_list_size(&view, 0).unwrap() == 2
    });

    assert_eq!(manager.notify(&view, 0, 1).unwrap(), 1);
    assert_eq!(first.join().unwrap(), WaitOutcome::Ok);
    assert_eq!(manager.waiter_list_size(&view, 0).unwrap(), 1);

    assert_eq!(manager.notify(&view, 0, 1).unwrap(), 1);
    assert_eq!(second.join().unwrap(), WaitOutcome::Ok);
    assert_eq!(manager.waiter_list_size(&view, 0).unwrap(), 0);
}

#[test]
fn test_wait_on_bigint64_element() {
    let manager = FutexManager::new();
    let block = SharedBlock::new_shared(32).unwrap();
    let view = SharedView::full(block, ElementKind::BigInt64).unwrap();
    view.store(1, i64::MIN).unwrap();

    assert_eq!(
        manager.wait(&view, 1, 0, None).unwrap(),
        WaitOutcome::NotEqual
    );

    let handle = {
        let m = manager.clone();
        let v = view.clone();
        thread::spawn(move || m.wait(&v, 1, i64::MIN, None).unwrap())
    };
    wait_until("waiter enqueued", || {
        manager.waiter_list_size(&view, 1).unwrap() == 1
    });

    assert_eq!(manager.notify(&view, 1, 1).unwrap(), 1);
    assert_eq!(handle.join().unwrap(), WaitOutcome::Ok);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Notify batches of any size drain waiters front-first: batch k
    /// always wakes the k oldest arrivals still queued
    #[test]
    fn prop_notify_batches_preserve_arrival_order(
        waiters in 2usize..=6,
        batch in 1usize..=3,
    ) {
        let manager = FutexManager::new();
        let view = shared_i32_view(16);
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..waiters {
            let m = manager.clone();
            let v = view.clone();
            let woken = Arc::clone(&order);
            handles.push(thread::spawn(move || {
                m.wait(&v, 0, 0, None).unwrap();
                woken.lock().unwrap().push(i);
            }));
            wait_until("waiter enqueued", || {
                manager.waiter_list_size(&view, 0).unwrap() == i + 1
            });
        }

        let mut woken_total = 0;
        while woken_total < waiters {
            let woken = manager.notify(&view, 0, batch).unwrap();
            prop_assert_eq!(woken, batch.min(waiters - woken_total));

            let expected_len = woken_total + woken;
            wait_until("batch woken", || order.lock().unwrap().len() == expected_len);

            // Scheduling may interleave pushes within one batch, but the
            // batch as a whole must be the oldest contiguous arrivals
            let mut slice: Vec<_> =
                order.lock().unwrap()[woken_total..expected_len].to_vec();
            slice.sort_unstable();
            prop_assert_eq!(slice, (woken_total..expected_len).collect::<Vec<_>>());
            woken_total = expected_len;
        }

        prop_assert_eq!(manager.notify(&view, 0, batch).unwrap(), 0);
        for handle in handles {
            handle.join().unwrap();
        }
        prop_assert_eq!(manager.waiter_list_size(&view, 0).unwrap(), 0);
    }
}
