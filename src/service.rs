//! Submit, visit and support flows on top of the ledger.

use url::Url;

use crate::config::Config;
use crate::core::{
    CoreError, Increment, InvalidText, SupporterId, WishId, WishRecord, initial_probability,
};
use crate::ledger::{Ledger, SupportOutcome};
use crate::sentiment::{self, Sentiment};
use crate::share::{ShareError, ShareLink};
use crate::Result;

/// Result of submitting a new wish.
#[derive(Clone, Debug)]
pub enum Submission {
    Created {
        wish_id: WishId,
        record: WishRecord,
        sentiment: Sentiment,
        share_url: Option<Url>,
        saved: bool,
    },
    /// Scored NEUTRAL or NEGATIVE; nothing was stored.
    Rejected { sentiment: Sentiment },
}

/// Result of opening a share link.
#[derive(Clone, Debug)]
pub enum Visit {
    Found { wish_id: WishId, record: WishRecord },
    Bootstrapped {
        wish_id: WishId,
        record: WishRecord,
        saved: bool,
    },
    /// Not stored, and the link carries no text to rebuild it from.
    Missing { wish_id: WishId },
}

impl Visit {
    pub fn record(&self) -> Option<&WishRecord> {
        match self {
            Visit::Found { record, .. } | Visit::Bootstrapped { record, .. } => Some(record),
            Visit::Missing { .. } => None,
        }
    }

    pub fn wish_id(&self) -> &WishId {
        match self {
            Visit::Found { wish_id, .. }
            | Visit::Bootstrapped { wish_id, .. }
            | Visit::Missing { wish_id } => wish_id,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SupportReceipt {
    pub increment: Increment,
    pub outcome: SupportOutcome,
}

#[derive(Clone, Debug)]
pub struct WishService {
    ledger: Ledger,
    config: Config,
}

impl WishService {
    pub fn new(ledger: Ledger, config: Config) -> Self {
        Self { ledger, config }
    }

    /// Ledger at the configured store path, with the configured lock policy.
    pub fn from_config(config: Config) -> Self {
        let ledger = Ledger::with_policy(config.store.resolved_path(), config.store.lock_policy())
            .with_max_text_chars(config.wish.max_chars);
        Self::new(ledger, config)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Trimmed text, if it satisfies the configured length bounds.
    pub fn validate_text<'a>(&self, text: &'a str) -> std::result::Result<&'a str, CoreError> {
        let trimmed = text.trim();
        let len = trimmed.chars().count();
        if len == 0 {
            return Err(InvalidText::Empty.into());
        }
        if len < self.config.wish.min_chars {
            return Err(InvalidText::TooShort {
                len,
                min: self.config.wish.min_chars,
            }
            .into());
        }
        if len > self.config.wish.max_chars {
            return Err(InvalidText::TooLong {
                len,
                max: self.config.wish.max_chars,
            }
            .into());
        }
        Ok(trimmed)
    }

    /// Score the text and, if it reads as a wish, store it under a fresh id.
    pub fn submit(&self, text: &str) -> Result<Submission> {
        let text = self.validate_text(text)?;
        let sentiment = sentiment::score(text);
        if !sentiment.is_positive() {
            tracing::info!(
                label = %sentiment.label,
                confidence = sentiment.confidence,
                "wish rejected by sentiment"
            );
            return Ok(Submission::Rejected { sentiment });
        }

        let wish_id = WishId::generate(text);
        let commit = self.ledger.create_or_touch(
            &wish_id,
            text,
            initial_probability(sentiment.confidence),
        )?;
        let share_url = match self.share_url(&wish_id, &commit.value) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(wish_id = %wish_id, error = %err, "could not build share link");
                None
            }
        };

        Ok(Submission::Created {
            wish_id,
            record: commit.value,
            sentiment,
            share_url,
            saved: commit.saved,
        })
    }

    /// Share link for a record the caller already holds.
    pub fn share_url(
        &self,
        wish_id: &WishId,
        record: &WishRecord,
    ) -> std::result::Result<Url, ShareError> {
        ShareLink::new(
            wish_id.clone(),
            &record.text,
            Some(record.current_probability),
            self.config.share.max_text_chars,
        )
        .to_url(&self.config.share.base_url)
    }

    /// Share link for a stored wish; `None` when no such record exists.
    pub fn share_link(&self, wish_id: &WishId) -> Result<Option<Url>> {
        let Some(record) = self.ledger.get(wish_id) else {
            return Ok(None);
        };
        Ok(Some(self.share_url(wish_id, &record)?))
    }

    /// Resolve a share link, rebuilding the record from the link if the
    /// store has lost it.
    pub fn visit(&self, link: &str) -> Result<Visit> {
        let link = ShareLink::parse(link)?;
        if let Some(record) = self.ledger.get(&link.wish_id) {
            return Ok(Visit::Found {
                wish_id: link.wish_id,
                record,
            });
        }

        let Some(text) = link.text.as_deref() else {
            tracing::debug!(wish_id = %link.wish_id, "share link without text, nothing to bootstrap");
            return Ok(Visit::Missing {
                wish_id: link.wish_id,
            });
        };
        // Link text is untrusted; keep only what a submission could have stored.
        let text: String = text.trim().chars().take(self.config.wish.max_chars).collect();
        let commit = self.ledger.bootstrap(&link.wish_id, &text, link.probability)?;
        Ok(Visit::Bootstrapped {
            wish_id: link.wish_id,
            record: commit.value,
            saved: commit.saved,
        })
    }

    /// Back a wish with a freshly drawn increment.
    pub fn support(&self, wish_id: &WishId, supporter: &SupporterId) -> SupportReceipt {
        self.support_with(wish_id, Increment::random(), supporter)
    }

    pub fn support_with(
        &self,
        wish_id: &WishId,
        increment: Increment,
        supporter: &SupporterId,
    ) -> SupportReceipt {
        SupportReceipt {
            increment,
            outcome: self.ledger.add_support(wish_id, increment, supporter),
        }
    }
}
