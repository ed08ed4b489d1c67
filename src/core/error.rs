//! Core capability errors (identifier parsing, value ranges, wish text).
//!
//! These are bounded and stable: core errors describe refused inputs, never
//! storage or library failures.

use thiserror::Error;

use crate::error::Transience;

/// Invalid identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidId {
    #[error("wish id `{raw}` is invalid: {reason}")]
    Wish { raw: String, reason: String },
    #[error("supporter id `{raw}` is invalid: {reason}")]
    Supporter { raw: String, reason: String },
}

/// Floating-point value outside its permitted range.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{field} value {value} out of range {min}..={max}")]
pub struct RangeError {
    pub field: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// Wish text refused before it reaches the ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidText {
    #[error("wish text is empty")]
    Empty,
    #[error("wish text has {len} characters, at least {min} required")]
    TooShort { len: usize, min: usize },
    #[error("wish text has {len} characters, at most {max} allowed")]
    TooLong { len: usize, max: usize },
}

/// Canonical error enum for the core capability.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    InvalidText(#[from] InvalidText),
}

impl CoreError {
    pub fn transience(&self) -> Transience {
        // Refused inputs stay refused.
        Transience::Permanent
    }
}
