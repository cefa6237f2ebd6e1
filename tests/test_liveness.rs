//! Liveness tests
//!
//! A slow transform at the head of the queue delays delivery of the results
//! behind it, but never the start of their transforms.


use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{wait_until, Gate};
use waste_manager::{infallible, Classification, WasteManager};

const FAST_ITEMS: usize = 32;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fast_transforms_start_while_slow_head_runs() {
    let gate = Gate::new();
    let started = Arc::new(AtomicUsize::new(0));

    let transformer = {
        let gate = gate.clone();
        let started = started.clone();
        infallible(move |item: usize| {
            started.fetch_add(1, Ordering::SeqCst);
            if item == 0 {
                gate.wait();
            }
            item * 100
        })
    };

    let manager = WasteManager::new(|_: &usize| Classification::<()>::Recyclable, transformer);

    manager.submit(0).unwrap();
    for item in 1..=FAST_ITEMS {
        manager.submit(item).unwrap();
    }

    // All K fast transforms start (and finish) while the head is still blocked.
    let all_started = wait_until(
        || started.load(Ordering::SeqCst) == FAST_ITEMS + 1,
        Duration::from_secs(5),
    )
    .await;
    assert!(all_started, "Fast transforms must not wait for the slow head");
    assert_eq!(gate.waiting(), 1);

    let all_finished = wait_until(
        || manager.metrics().snapshot().transforms.completed == FAST_ITEMS as u64,
        Duration::from_secs(5),
    )
    .await;
    assert!(all_finished);

    // Delivery still waits for the head.
    let early = tokio::time::timeout(Duration::from_millis(50), manager.next_output()).await;
    assert!(early.is_err(), "Nothing may be delivered before the head resolves");

    gate.open();

    for item in 0..=FAST_ITEMS {
        assert_eq!(manager.next_output().await.unwrap(), item * 100);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_submit_does_not_wait_for_transforms() {
    let gate = Gate::new();
    let transformer = {
        let gate = gate.clone();
        infallible(move |item: u32| {
            gate.wait();
            item
        })
    };
    let manager = WasteManager::new(|_: &u32| Classification::<()>::Recyclable, transformer);

    let submitted = tokio::time::timeout(Duration::from_millis(500), async {
        for item in 0..200 {
            manager.submit(item).unwrap();
        }
    })
    .await;
    assert!(submitted.is_ok(), "Submission must not block on transforms");

    gate.open();
    for item in 0..200 {
        assert_eq!(manager.next_output().await.unwrap(), item);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_waste_flows_while_transforms_are_blocked() {
    let gate = Gate::new();
    let transformer = {
        let gate = gate.clone();
        infallible(move |item: i32| {
            gate.wait();
            item
        })
    };
    let manager = WasteManager::new(
        |n: &i32| -> Classification<i32> { (*n > 0, *n).into() },
        transformer,
    );

    for n in [1, -1, 2, -2, 3, -3] {
        manager.submit(n).unwrap();
    }

    for expected in [-1, -2, -3] {
        let waste = tokio::time::timeout(Duration::from_secs(1), manager.next_waste())
            .await
            .expect("waste must not wait on blocked transforms");
        assert_eq!(waste.unwrap(), expected);
    }

    gate.open();
    for expected in [1, 2, 3] {
        assert_eq!(manager.next_output().await.unwrap(), expected);
    }
}
