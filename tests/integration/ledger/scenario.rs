//! Submit, share, and support a wish end to end.

use wish_ledger::config::Config;
use wish_ledger::core::{Increment, SupporterId, WishId, initial_probability};
use wish_ledger::sentiment::{self, SentimentLabel};
use wish_ledger::service::{Submission, Visit, WishService};

use crate::fixtures::store_dir::{TempStoreDir, approx_eq};

fn inc(value: f64) -> Increment {
    Increment::new(value).expect("increment")
}

fn who(raw: &str) -> SupporterId {
    SupporterId::new(raw).expect("supporter")
}

#[test]
fn travel_wish_gathers_support() {
    let store = TempStoreDir::new().expect("temp store");
    let ledger = store.ledger();
    let text = "I wish to travel the world";

    let scored = sentiment::score(text);
    assert_eq!(scored.label, SentimentLabel::Positive);
    let initial = initial_probability(scored.confidence);
    assert!(approx_eq(initial, (60.0 + 20.0 * scored.confidence).min(99.9)));

    let id = WishId::generate(text);
    let record = ledger
        .create_or_touch(&id, text, initial)
        .expect("create")
        .into_value();
    assert_eq!(record.current_probability, initial);
    assert!(record.supporters.is_empty());

    let (accepted, p) = ledger.add_support(&id, inc(5.0), &who("alice")).as_pair();
    assert!(accepted);
    assert!(approx_eq(p, initial + 5.0));

    let (accepted, p) = ledger.add_support(&id, inc(7.0), &who("alice")).as_pair();
    assert!(!accepted);
    assert!(approx_eq(p, initial + 5.0));

    let (accepted, p) = ledger.add_support(&id, inc(7.0), &who("bob")).as_pair();
    assert!(accepted);
    assert!(approx_eq(p, initial + 12.0));

    let stored = ledger.get(&id).expect("stored");
    assert_eq!(stored.supporters, vec![who("alice"), who("bob")]);
    assert_eq!(stored.version, 3);
}

#[test]
fn missing_wish_is_absent_and_unsupportable() {
    let store = TempStoreDir::new().expect("temp store");
    let ledger = store.ledger();
    let id = WishId::parse("nonexistent").expect("id");

    assert!(ledger.get(&id).is_none());
    assert_eq!(ledger.add_support(&id, inc(5.0), &who("carol")).as_pair(), (false, 0.0));
}

#[test]
fn resubmitting_keeps_supporter_progress() {
    let store = TempStoreDir::new().expect("temp store");
    let ledger = store.ledger();
    let id = WishId::parse("pageload").expect("id");

    let first = ledger
        .create_or_touch(&id, "I hope to learn piano", 75.0)
        .expect("create")
        .into_value();
    ledger.add_support(&id, inc(2.5), &who("dana"));
    for _ in 0..3 {
        ledger
            .create_or_touch(&id, "I hope to learn the piano", 61.0)
            .expect("touch");
    }

    let record = ledger.get(&id).expect("record");
    assert_eq!(record.text, "I hope to learn the piano");
    assert_eq!(record.initial_probability, first.initial_probability);
    assert_eq!(record.current_probability, 77.5);
    assert_eq!(record.supporters, vec![who("dana")]);
    assert_eq!(record.created_at, first.created_at);
    assert_eq!(record.version, 5);
}

#[test]
fn shared_link_survives_a_lost_store() {
    let origin = TempStoreDir::new().expect("origin store");
    let mut config = Config::default();
    config.store.path = Some(origin.store_path());
    let service = WishService::from_config(config.clone());

    let Submission::Created {
        record, share_url, ..
    } = service.submit("I want to build a treehouse").expect("submit")
    else {
        panic!("expected a created wish");
    };
    let link = share_url.expect("share url");

    // The deployment restarts with an empty store.
    let fresh = TempStoreDir::new().expect("fresh store");
    config.store.path = Some(fresh.store_path());
    let restarted = WishService::from_config(config);

    let visit = restarted.visit(link.as_str()).expect("visit");
    let Visit::Bootstrapped {
        wish_id,
        record: rebuilt,
        ..
    } = visit
    else {
        panic!("expected the record to be rebuilt, got {visit:?}");
    };
    assert_eq!(rebuilt.text, record.text);
    assert!(approx_eq(
        rebuilt.initial_probability,
        (record.current_probability * 10.0).round() / 10.0
    ));

    let receipt = restarted.support(&wish_id, &SupporterId::generate());
    assert!(receipt.outcome.accepted());
    assert_eq!(
        restarted.ledger().get(&wish_id).expect("stored").supporter_count(),
        1
    );
}
