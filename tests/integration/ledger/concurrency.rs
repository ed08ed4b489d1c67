//! Many sessions, one store file: no lost or double-counted support.

use std::sync::{Arc, Barrier};
use std::thread;

use wish_ledger::core::{Increment, SupporterId, WishId};
use wish_ledger::ledger::{Ledger, StoreLock, SupportOutcome};

use crate::fixtures::store_dir::{TempStoreDir, approx_eq, patient_policy};

const SESSIONS: usize = 16;

#[test]
fn concurrent_distinct_supporters_are_all_counted() {
    let store = TempStoreDir::new().expect("temp store");
    let id = WishId::parse("crowded").expect("id");
    store
        .ledger()
        .create_or_touch(&id, "I wish for a full house", 20.0)
        .expect("create");

    let path = store.store_path();
    let barrier = Arc::new(Barrier::new(SESSIONS));
    let handles: Vec<_> = (1..=SESSIONS)
        .map(|n| {
            let path = path.clone();
            let id = id.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let ledger = Ledger::with_policy(path, patient_policy());
                let supporter = SupporterId::new(format!("session-{n}")).expect("supporter");
                let increment = Increment::new(n as f64 * 0.5).expect("increment");
                barrier.wait();
                ledger.add_support(&id, increment, &supporter)
            })
        })
        .collect();

    for handle in handles {
        let outcome = handle.join().expect("support thread");
        assert!(
            matches!(outcome, SupportOutcome::Accepted { saved: true, .. }),
            "unexpected outcome {outcome:?}"
        );
    }

    let total: f64 = (1..=SESSIONS).map(|n| n as f64 * 0.5).sum();
    let record = store.ledger().get(&id).expect("record");
    assert_eq!(record.supporter_count(), SESSIONS);
    assert!(approx_eq(record.current_probability, 20.0 + total));
    assert!(approx_eq(record.total_increment_applied, total));
    assert_eq!(record.version, 1 + SESSIONS as u64);
    assert!(!StoreLock::path_for(&path).exists());
}

#[test]
fn concurrent_support_saturates_at_ceiling() {
    let store = TempStoreDir::new().expect("temp store");
    let id = WishId::parse("ceiling").expect("id");
    store
        .ledger()
        .create_or_touch(&id, "I hope to win", 90.0)
        .expect("create");

    let path = store.store_path();
    let handles: Vec<_> = (0..SESSIONS)
        .map(|n| {
            let path = path.clone();
            let id = id.clone();
            thread::spawn(move || {
                let ledger = Ledger::with_policy(path, patient_policy());
                let supporter = SupporterId::new(format!("fan-{n}")).expect("supporter");
                ledger.add_support(&id, Increment::new(10.0).expect("increment"), &supporter)
            })
        })
        .collect();

    let mut last_seen = 0.0_f64;
    for handle in handles {
        let outcome = handle.join().expect("support thread");
        assert!(outcome.accepted());
        assert!(outcome.probability() <= 99.9);
        last_seen = last_seen.max(outcome.probability());
    }

    let record = store.ledger().get(&id).expect("record");
    assert_eq!(record.current_probability, 99.9);
    assert_eq!(last_seen, 99.9);
    assert_eq!(record.supporter_count(), SESSIONS);
    assert!(approx_eq(record.total_increment_applied, 10.0 * SESSIONS as f64));
}

#[test]
fn same_supporter_racing_is_counted_once() {
    let store = TempStoreDir::new().expect("temp store");
    let id = WishId::parse("onceonly").expect("id");
    store
        .ledger()
        .create_or_touch(&id, "I want one vote each", 50.0)
        .expect("create");

    let path = store.store_path();
    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let path = path.clone();
            let id = id.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let ledger = Ledger::with_policy(path, patient_policy());
                let supporter = SupporterId::new("double-clicker").expect("supporter");
                barrier.wait();
                ledger
                    .add_support(&id, Increment::new(3.0).expect("increment"), &supporter)
                    .accepted()
            })
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|h| h.join().expect("support thread"))
        .filter(|accepted| *accepted)
        .count();

    assert_eq!(accepted, 1);
    let record = store.ledger().get(&id).expect("record");
    assert_eq!(record.current_probability, 53.0);
    assert_eq!(record.supporter_count(), 1);
}

#[test]
fn concurrent_creates_of_different_wishes_all_land() {
    let store = TempStoreDir::new().expect("temp store");
    let path = store.store_path();

    let handles: Vec<_> = (0..SESSIONS)
        .map(|n| {
            let path = path.clone();
            thread::spawn(move || {
                let ledger = Ledger::with_policy(path, patient_policy());
                let id = WishId::parse(&format!("wish-{n}")).expect("id");
                ledger
                    .create_or_touch(&id, &format!("I wish number {n}"), 65.0)
                    .expect("create")
                    .saved
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("create thread"));
    }
    assert_eq!(store.ledger().snapshot().len(), SESSIONS);
}
