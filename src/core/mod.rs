//! Domain atoms for the wish ledger.
//!
//! Layer 0: time
//! Layer 1: identity, probability arithmetic
//! Layer 2: wish records

pub mod error;
pub mod identity;
pub mod probability;
pub mod time;
pub mod wish;

pub use error::{CoreError, InvalidId, InvalidText, RangeError};
pub use identity::{SupporterId, WISH_ID_LEN, WishId};
pub use probability::{
    DEFAULT_BOOTSTRAP_PROBABILITY, Increment, MAX_INCREMENT, MAX_PROBABILITY, MIN_INCREMENT,
    check_probability, clamp_probability, initial_probability, random_increment,
};
pub use time::WallClock;
pub use wish::{MAX_TEXT_CHARS, SupportApplied, WishRecord};
