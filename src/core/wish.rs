//! Wish records and the pure rules that mutate them.
//!
//! The ledger owns persistence and locking; everything here runs on a
//! record already loaded under the store lock.

use serde::{Deserialize, Serialize};

use super::identity::SupporterId;
use super::probability::{Increment, MAX_PROBABILITY};
use super::time::WallClock;

/// Upper bound on stored wish text, in characters.
pub const MAX_TEXT_CHARS: usize = 2_000;

/// One wish, as persisted under its id in the store collection.
///
/// Field names follow the on-disk format shared with older writers, which
/// may omit `supporters`, `total_luck_added` or `version`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WishRecord {
    #[serde(rename = "wish_text", alias = "text")]
    pub text: String,
    #[serde(default)]
    pub initial_probability: f64,
    #[serde(default)]
    pub current_probability: f64,
    #[serde(default)]
    pub supporters: Vec<SupporterId>,
    #[serde(rename = "total_luck_added", default)]
    pub total_increment_applied: f64,
    #[serde(default)]
    pub created_at: WallClock,
    #[serde(default)]
    pub last_updated: WallClock,
    #[serde(default = "first_version")]
    pub version: u64,
}

/// Result of applying one support action to a record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SupportApplied {
    /// Supporter was new; the record changed.
    Accepted { probability: f64 },
    /// Supporter already counted; the record is untouched.
    Duplicate { probability: f64 },
}

fn first_version() -> u64 {
    1
}

impl WishRecord {
    pub fn new(text: impl Into<String>, initial_probability: f64, now: WallClock) -> Self {
        Self {
            text: text.into(),
            initial_probability,
            current_probability: initial_probability,
            supporters: Vec::new(),
            total_increment_applied: 0.0,
            created_at: now,
            last_updated: now,
            version: first_version(),
        }
    }

    /// Re-submission of an existing wish: refresh text only.
    ///
    /// Probabilities and supporters are never reset here.
    pub fn touch(&mut self, text: impl Into<String>, now: WallClock) {
        self.text = text.into();
        self.last_updated = now;
        self.version += 1;
    }

    pub fn has_supporter(&self, supporter: &SupporterId) -> bool {
        self.supporters.iter().any(|s| s == supporter)
    }

    pub fn supporter_count(&self) -> usize {
        self.supporters.len()
    }

    pub fn apply_support(
        &mut self,
        supporter: &SupporterId,
        increment: Increment,
        now: WallClock,
    ) -> SupportApplied {
        if self.has_supporter(supporter) {
            return SupportApplied::Duplicate {
                probability: self.current_probability,
            };
        }
        self.supporters.push(supporter.clone());
        // max() keeps a legacy record that already sits above the ceiling from dropping.
        let raised = (self.current_probability + increment.value()).min(MAX_PROBABILITY);
        self.current_probability = raised.max(self.current_probability);
        self.total_increment_applied += increment.value();
        self.last_updated = now;
        self.version += 1;
        SupportApplied::Accepted {
            probability: self.current_probability,
        }
    }
}
