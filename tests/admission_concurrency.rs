use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use courier_intake::admission::AdmissionController;

const COOLDOWN: Duration = Duration::from_millis(4_000);

#[test]
fn simultaneous_first_calls_grant_exactly_once() {
    const WORKERS: usize = 32;

    for _round in 0..20 {
        let gate = AdmissionController::new();
        let barrier = Arc::new(Barrier::new(WORKERS));

        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                let gate = gate.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    gate.is_allowed("203.0.113.5", COOLDOWN)
                })
            })
            .collect();

        let granted = handles
            .into_iter()
            .map(|handle| handle.join().expect("worker"))
            .filter(|allowed| *allowed)
            .count();

        assert_eq!(granted, 1);
    }
}

#[test]
fn unrelated_identities_are_granted_independently() {
    const WORKERS: usize = 16;
    let gate = AdmissionController::new();
    let barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let gate = gate.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                gate.is_allowed(&format!("198.51.100.{worker}"), COOLDOWN)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("worker"));
    }
    assert_eq!(gate.tracked_callers(), WORKERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_grant_exactly_once() {
    let gate = AdmissionController::new();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..64 {
        let gate = gate.clone();
        tasks.spawn(async move { gate.is_allowed("cam-7", COOLDOWN) });
    }

    let mut granted = 0;
    while let Some(joined) = tasks.join_next().await {
        if joined.expect("task") {
            granted += 1;
        }
    }
    assert_eq!(granted, 1);
}

#[test]
fn sequential_calls_follow_the_cooldown() {
    let gate = AdmissionController::new();
    assert!(gate.is_allowed_at("10.1.1.1", COOLDOWN, 0));
    assert!(!gate.is_allowed_at("10.1.1.1", COOLDOWN, 3_999));
    assert!(gate.is_allowed_at("10.1.1.1", COOLDOWN, 4_000));
}
