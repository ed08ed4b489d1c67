//! On-disk compatibility with stores written by older clients.

use wish_ledger::core::{Increment, SupporterId, WishId};

use crate::fixtures::store_dir::TempStoreDir;

const LEGACY_STORE: &str = r#"{
  "a1b2c3d4e5": {
    "wish_text": "I wish to see the northern lights",
    "initial_probability": 78.0,
    "current_probability": 78.0,
    "created_at": 1734567890.5,
    "last_updated": 1734567890.5
  },
  "f00dfeed00": {
    "text": "I hope my garden grows",
    "initial_probability": 70.0,
    "current_probability": 74.2,
    "supporters": ["supporter-1"],
    "total_luck_added": 4.2,
    "created_at": 1734567000.0,
    "last_updated": 1734567100.0,
    "version": 2
  },
  "broken": "not a record"
}
"#;

#[test]
fn legacy_records_load_with_defaults() {
    let store = TempStoreDir::new().expect("temp store");
    store.write_store(LEGACY_STORE).expect("seed store");
    let ledger = store.ledger();

    let sparse = ledger
        .get(&WishId::parse("a1b2c3d4e5").expect("id"))
        .expect("sparse record");
    assert!(sparse.supporters.is_empty());
    assert_eq!(sparse.total_increment_applied, 0.0);
    assert_eq!(sparse.version, 1);
    assert_eq!(sparse.created_at.0, 1_734_567_890_500);

    let aliased = ledger
        .get(&WishId::parse("f00dfeed00").expect("id"))
        .expect("aliased record");
    assert_eq!(aliased.text, "I hope my garden grows");
    assert_eq!(aliased.version, 2);

    assert_eq!(ledger.snapshot().len(), 2);
    assert_eq!(ledger.snapshot().opaque_len(), 1);
}

#[test]
fn writes_keep_unreadable_entries_and_use_shared_field_names() {
    let store = TempStoreDir::new().expect("temp store");
    store.write_store(LEGACY_STORE).expect("seed store");
    let ledger = store.ledger();
    let id = WishId::parse("a1b2c3d4e5").expect("id");

    let outcome = ledger.add_support(
        &id,
        Increment::new(3.0).expect("increment"),
        &SupporterId::new("supporter-2").expect("supporter"),
    );
    assert!(outcome.accepted());

    let raw = store.read_store().expect("read store");
    assert_eq!(raw["broken"], "not a record");
    let written = &raw["a1b2c3d4e5"];
    assert_eq!(written["wish_text"], "I wish to see the northern lights");
    assert_eq!(written["current_probability"], 81.0);
    assert_eq!(written["total_luck_added"], 3.0);
    assert_eq!(written["supporters"][0], "supporter-2");
    assert_eq!(written["version"], 2);
    assert!(written["last_updated"].as_f64().expect("seconds") > 1_734_567_890.5);
    assert_eq!(raw["f00dfeed00"]["wish_text"], "I hope my garden grows");
}

#[test]
fn non_object_store_reads_as_empty() {
    let store = TempStoreDir::new().expect("temp store");
    store.write_store("[1, 2, 3]").expect("seed store");
    let ledger = store.ledger();

    assert!(ledger.snapshot().is_empty());
    assert!(ledger.get(&WishId::parse("anything").expect("id")).is_none());
}
