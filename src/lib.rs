#![forbid(unsafe_code)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod ledger;
pub mod paths;
pub mod sentiment;
pub mod service;
pub mod share;
pub mod telemetry;

pub use error::{Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::core::{
    Increment, SupportApplied, SupporterId, WallClock, WishId, WishRecord, initial_probability,
    random_increment,
};
pub use crate::ledger::{Commit, Ledger, SupportOutcome};
pub use crate::sentiment::{Sentiment, SentimentLabel, score};
pub use crate::service::{Submission, SupportReceipt, Visit, WishService};
pub use crate::share::ShareLink;

/// `generate_wish_id(text)`: short id derived from the text and the current time.
pub fn generate_wish_id(text: &str) -> WishId {
    WishId::generate(text)
}
