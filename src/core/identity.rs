//! Identity atoms
//!
//! WishId: short URL-safe key of a wish record
//! SupporterId: per-session dedup key for support actions

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{CoreError, InvalidId};
use super::time::WallClock;

/// Hex characters kept from the content hash when generating wish ids.
pub const WISH_ID_LEN: usize = 10;

/// Wish identifier.
///
/// Generated ids are lowercase hex, but stores written by other tools may
/// carry any URL-safe token, so parsing accepts `[A-Za-z0-9_-]+`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WishId(String);

impl WishId {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidId::Wish {
                raw: s.to_string(),
                reason: "empty".into(),
            }
            .into());
        }
        if !trimmed.bytes().all(is_url_safe) {
            return Err(InvalidId::Wish {
                raw: s.to_string(),
                reason: "contains characters outside [A-Za-z0-9_-]".into(),
            }
            .into());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Derive a fresh id from the wish text and the current time.
    ///
    /// Collisions are possible in principle and not handled.
    pub fn generate(text: &str) -> Self {
        Self::derive(text, WallClock::now_nanos())
    }

    pub(crate) fn derive(text: &str, at_nanos: u128) -> Self {
        let mut h = Sha256::new();
        h.update(text.as_bytes());
        h.update([0]);
        h.update(at_nanos.to_be_bytes());
        let digest = h.finalize();
        let mut hex = hex::encode(&digest[..WISH_ID_LEN.div_ceil(2)]);
        hex.truncate(WISH_ID_LEN);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for WishId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WishId({:?})", self.0)
    }
}

impl fmt::Display for WishId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supporter identifier - non-empty string.
///
/// One per browsing session. Nothing stops a caller from minting a new one,
/// so it deduplicates honest sessions only.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupporterId(String);

impl SupporterId {
    pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.trim().is_empty() {
            Err(InvalidId::Supporter {
                raw: s,
                reason: "empty".into(),
            }
            .into())
        } else {
            Ok(Self(s))
        }
    }

    pub fn generate() -> Self {
        Self(format!("supporter-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SupporterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SupporterId({:?})", self.0)
    }
}

impl fmt::Display for SupporterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_url_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
