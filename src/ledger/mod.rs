//! Wish ledger: shared, file-backed store of wish records.
//!
//! Every mutation runs as load, mutate, save while holding the store lock.
//! Storage trouble never escapes as an error: reads degrade to "no record"
//! and failed writes come back as `saved: false`. Only refused inputs are
//! returned as errors.

mod lock;
mod store;

use std::path::{Path, PathBuf};

use crate::core::{
    CoreError, DEFAULT_BOOTSTRAP_PROBABILITY, Increment, InvalidText, MAX_TEXT_CHARS,
    SupportApplied, SupporterId, WallClock, WishId, WishRecord, check_probability,
    clamp_probability,
};

pub use lock::{LockError, LockMeta, LockPolicy, StoreLock};
pub use store::{Collection, JsonStore, StoreError};

/// A value produced by a mutation, plus whether it reached disk.
#[derive(Clone, Debug, PartialEq)]
pub struct Commit<T> {
    pub value: T,
    pub saved: bool,
}

impl<T> Commit<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Outcome of one support action.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SupportOutcome {
    /// Supporter recorded; `probability` is the new current value.
    Accepted { probability: f64, saved: bool },
    /// Supporter was already counted; nothing changed.
    AlreadySupported { probability: f64 },
    /// No record under that id.
    NotFound,
}

impl SupportOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self, SupportOutcome::Accepted { .. })
    }

    /// Resulting probability; 0.0 when there was nothing to support.
    pub fn probability(&self) -> f64 {
        match *self {
            SupportOutcome::Accepted { probability, .. }
            | SupportOutcome::AlreadySupported { probability } => probability,
            SupportOutcome::NotFound => 0.0,
        }
    }

    /// The `(accepted, resulting_probability)` pair.
    pub fn as_pair(&self) -> (bool, f64) {
        (self.accepted(), self.probability())
    }
}

#[derive(Clone, Debug)]
pub struct Ledger {
    store: JsonStore,
    policy: LockPolicy,
    max_text_chars: usize,
}

impl Ledger {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_policy(path, LockPolicy::default())
    }

    pub fn with_policy(path: impl Into<PathBuf>, policy: LockPolicy) -> Self {
        Self {
            store: JsonStore::new(path),
            policy,
            max_text_chars: MAX_TEXT_CHARS,
        }
    }

    /// Refuse texts longer than `max_chars` characters.
    pub fn with_max_text_chars(mut self, max_chars: usize) -> Self {
        self.max_text_chars = max_chars;
        self
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn policy(&self) -> LockPolicy {
        self.policy
    }

    pub fn max_text_chars(&self) -> usize {
        self.max_text_chars
    }

    /// Current persisted record, read without the lock.
    ///
    /// May trail a writer that is mid-transaction by at most one write.
    pub fn get(&self, id: &WishId) -> Option<WishRecord> {
        let record = self.store.load().get(id).cloned();
        tracing::debug!(wish_id = %id, found = record.is_some(), "ledger get");
        record
    }

    pub fn exists(&self, id: &WishId) -> bool {
        self.store.load().contains(id)
    }

    /// All readable records, for listings.
    pub fn snapshot(&self) -> Collection {
        self.store.load()
    }

    /// Create the record, or refresh the text of an existing one.
    ///
    /// An existing record keeps its probabilities and supporters.
    pub fn create_or_touch(
        &self,
        id: &WishId,
        text: &str,
        initial_probability: f64,
    ) -> Result<Commit<WishRecord>, CoreError> {
        self.check_text(text)?;
        let initial_probability = check_probability("initial_probability", initial_probability)?;

        Ok(self.transact(|collection, now| {
            let record = match collection.get_mut(id) {
                Some(record) => {
                    record.touch(text, now);
                    tracing::info!(wish_id = %id, version = record.version, "wish touched");
                    record.clone()
                }
                None => {
                    let record = WishRecord::new(text, initial_probability, now);
                    collection.insert(id.clone(), record.clone());
                    tracing::info!(
                        wish_id = %id,
                        probability = initial_probability,
                        "wish created"
                    );
                    record
                }
            };
            (record, true)
        }))
    }

    /// Lazily create a record from share-link data.
    ///
    /// An existing record is returned untouched: the hint never overrides
    /// stored progress. Hints outside the valid range are clamped.
    pub fn bootstrap(
        &self,
        id: &WishId,
        text: &str,
        probability_hint: Option<f64>,
    ) -> Result<Commit<WishRecord>, CoreError> {
        self.check_text(text)?;
        let initial = probability_hint
            .map(clamp_probability)
            .unwrap_or(DEFAULT_BOOTSTRAP_PROBABILITY);

        Ok(self.transact(|collection, now| {
            if let Some(existing) = collection.get(id) {
                return (existing.clone(), false);
            }
            let record = WishRecord::new(text, initial, now);
            collection.insert(id.clone(), record.clone());
            tracing::info!(wish_id = %id, probability = initial, "wish bootstrapped from share link");
            (record, true)
        }))
    }

    /// Count `supporter` toward the wish once, raising its probability.
    pub fn add_support(
        &self,
        id: &WishId,
        increment: Increment,
        supporter: &SupporterId,
    ) -> SupportOutcome {
        let commit = self.transact(|collection, now| {
            let Some(record) = collection.get_mut(id) else {
                return (SupportOutcome::NotFound, false);
            };
            match record.apply_support(supporter, increment, now) {
                SupportApplied::Accepted { probability } => {
                    tracing::info!(
                        wish_id = %id,
                        supporter = %supporter,
                        increment = increment.value(),
                        probability,
                        supporters = record.supporter_count(),
                        "support accepted"
                    );
                    (
                        SupportOutcome::Accepted {
                            probability,
                            saved: true,
                        },
                        true,
                    )
                }
                SupportApplied::Duplicate { probability } => {
                    tracing::debug!(wish_id = %id, supporter = %supporter, "support already counted");
                    (SupportOutcome::AlreadySupported { probability }, false)
                }
            }
        });
        match commit.value {
            SupportOutcome::Accepted { probability, .. } => SupportOutcome::Accepted {
                probability,
                saved: commit.saved,
            },
            other => other,
        }
    }

    /// Run `mutate` inside the store lock and persist when it reports a change.
    ///
    /// If the lock cannot be taken within the policy timeout the mutation
    /// still runs, unlocked: a rare lost update beats a hung caller. A store
    /// that exists but could not be read (or moved aside) is never written
    /// over; the change is reported as unsaved instead.
    fn transact<T>(
        &self,
        mutate: impl FnOnce(&mut Collection, WallClock) -> (T, bool),
    ) -> Commit<T> {
        let guard = match StoreLock::acquire(self.store.path(), self.policy) {
            Ok(guard) => Some(guard),
            Err(err) => {
                tracing::warn!(
                    path = ?self.store.path(),
                    error = %err,
                    retryable = err.transience().is_retryable(),
                    "proceeding without store lock"
                );
                None
            }
        };

        let now = WallClock::now();
        let loaded = self.load_for_write(now);
        let writable = loaded.is_some();
        let mut collection = loaded.unwrap_or_default();

        let (value, changed) = mutate(&mut collection, now);
        let saved = if !changed {
            true
        } else if !writable {
            tracing::warn!(path = ?self.store.path(), "store left untouched, change not saved");
            false
        } else {
            match self.store.save(&collection) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(path = ?self.store.path(), error = %err, "store write failed");
                    false
                }
            }
        };

        if let Some(guard) = guard {
            if let Err(err) = guard.release() {
                tracing::warn!(error = %err, "failed to release store lock");
            }
        }
        Commit { value, saved }
    }

    /// Collection to mutate and save back.
    ///
    /// A corrupt file is moved aside first. `None` when the file is still in
    /// place but unreadable: saving over it would drop its records.
    fn load_for_write(&self, now: WallClock) -> Option<Collection> {
        match self.store.try_load() {
            Ok(collection) => Some(collection),
            Err(err) if err.is_corrupt() => match self.store.quarantine(now) {
                Ok(moved) => {
                    tracing::warn!(error = %err, moved_to = ?moved, "quarantined unreadable store");
                    Some(Collection::new())
                }
                Err(move_err) => {
                    tracing::warn!(error = %err, quarantine_error = %move_err, "store unreadable and could not be moved aside");
                    None
                }
            },
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    retryable = err.transience().is_retryable(),
                    "store unreadable"
                );
                None
            }
        }
    }

    fn check_text(&self, text: &str) -> Result<(), CoreError> {
        if text.trim().is_empty() {
            return Err(InvalidText::Empty.into());
        }
        let len = text.chars().count();
        if len > self.max_text_chars {
            return Err(InvalidText::TooLong {
                len,
                max: self.max_text_chars,
            }
            .into());
        }
        Ok(())
    }
}
