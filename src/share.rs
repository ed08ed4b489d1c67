//! Share links: `<base>/?wish_id=<id>&wish=<text>&prob=<p>`.
//!
//! The text and probability ride along only so a visitor can bootstrap a
//! record the store has lost. They never override a stored record.

use thiserror::Error;
use url::Url;

use crate::core::{CoreError, WishId, clamp_probability};

#[derive(Clone, Debug, PartialEq)]
pub struct ShareLink {
    pub wish_id: WishId,
    pub text: Option<String>,
    pub probability: Option<f64>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShareError {
    #[error("invalid share base url `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("share link has no wish_id")]
    MissingWishId,
    #[error(transparent)]
    InvalidWishId(#[from] CoreError),
}

impl ShareLink {
    /// Link for a wish; `text` is cleaned and cut to `max_text_chars`.
    pub fn new(
        wish_id: WishId,
        text: &str,
        probability: Option<f64>,
        max_text_chars: usize,
    ) -> Self {
        let text = clean_text(text, max_text_chars);
        Self {
            wish_id,
            text: (!text.is_empty()).then_some(text),
            probability: probability.map(clamp_probability),
        }
    }

    pub fn to_url(&self, base_url: &str) -> Result<Url, ShareError> {
        let mut url = Url::parse(base_url.trim()).map_err(|source| ShareError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("wish_id", self.wish_id.as_str());
            if let Some(text) = &self.text {
                query.append_pair("wish", text);
            }
            if let Some(probability) = self.probability {
                query.append_pair("prob", &format!("{probability:.1}"));
            }
        }
        Ok(url)
    }

    /// Parse a full link, or just its query string.
    pub fn parse(link: &str) -> Result<Self, ShareError> {
        let link = link.trim();
        let query = match Url::parse(link) {
            Ok(url) => url.query().unwrap_or_default().to_string(),
            Err(_) => link
                .split_once('?')
                .map(|(_, q)| q)
                .unwrap_or(link)
                .to_string(),
        };

        let mut wish_id = None;
        let mut text = None;
        let mut probability = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "wish_id" if wish_id.is_none() => wish_id = Some(value.into_owned()),
                "wish" if text.is_none() => {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        text = Some(trimmed.to_string());
                    }
                }
                "prob" if probability.is_none() => probability = parse_probability_hint(&value),
                _ => {}
            }
        }

        let wish_id = wish_id.ok_or(ShareError::MissingWishId)?;
        Ok(Self {
            wish_id: WishId::parse(&wish_id)?,
            text,
            probability,
        })
    }
}

/// Single-line, quote-safe, length-bounded copy of the wish text.
pub fn clean_text(text: &str, max_chars: usize) -> String {
    let cut: String = text.chars().take(max_chars).collect();
    let mut out = String::with_capacity(cut.len());
    let mut last_space = false;
    for c in cut.chars() {
        let c = match c {
            '\n' | '\r' => ' ',
            '"' => '\'',
            other => other,
        };
        if c == ' ' {
            if last_space {
                continue;
            }
            last_space = true;
        } else {
            last_space = false;
        }
        out.push(c);
    }
    out.trim().to_string()
}

/// Lenient probability parsing: `" 72.5% "`, `"1,5"`, `"250"` (clamped).
pub fn parse_probability_hint(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let value: f64 = cleaned.trim().parse().ok()?;
    if value.is_nan() {
        return None;
    }
    Some(clamp_probability(value))
}
