//! Human renderer for CLI outputs.
//!
//! Pure formatting; handlers gather the data.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

use crate::core::{Increment, SupporterId, WallClock, WishId, WishRecord};
use crate::ledger::SupportOutcome;
use crate::sentiment::Sentiment;

const WISH_TIPS: &[&str] = &[
    "start with \"I wish\", \"I hope\" or \"I want\"",
    "say what you want to happen, not what you want to avoid",
    "name something concrete: learn, travel, build, finish",
];

pub fn render_score(sentiment: &Sentiment, initial_probability: f64) -> String {
    format!(
        "{} ({:.2})\n  Starting probability: {:.1}%",
        sentiment.label, sentiment.confidence, initial_probability
    )
}

pub fn render_created(
    id: &WishId,
    record: &WishRecord,
    sentiment: &Sentiment,
    share_url: Option<&Url>,
    saved: bool,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("✓ Wish recorded: {id}\n"));
    out.push_str(&format!("  Wish: {}\n", record.text));
    out.push_str(&format!(
        "  Sentiment: {} ({:.2})\n",
        sentiment.label, sentiment.confidence
    ));
    out.push_str(&format!(
        "  Probability: {:.1}%",
        record.current_probability
    ));
    if let Some(url) = share_url {
        out.push_str(&format!("\n  Share: {url}"));
    }
    if !saved {
        out.push_str("\n  ⚠ the store could not be written; this wish may not persist");
    }
    out
}

pub fn render_rejected(sentiment: &Sentiment) -> String {
    let mut out = format!(
        "✗ That does not read like a wish yet ({}, {:.2}).\n  Try to:",
        sentiment.label, sentiment.confidence
    );
    for tip in WISH_TIPS {
        out.push_str(&format!("\n  - {tip}"));
    }
    out
}

pub fn render_record(id: &WishId, record: &WishRecord) -> String {
    let supporters = record.supporter_count();
    let mut out = String::new();
    out.push_str(&format!("{id}\n"));
    out.push_str(&format!("  Wish: {}\n", record.text));
    out.push_str(&format!(
        "  Probability: {:.1}% (started at {:.1}%, +{:.1} from {} {})\n",
        record.current_probability,
        record.initial_probability,
        record.total_increment_applied,
        supporters,
        if supporters == 1 { "supporter" } else { "supporters" }
    ));
    out.push_str(&format!("  Created: {}\n", format_time(record.created_at)));
    out.push_str(&format!("  Updated: {}\n", format_time(record.last_updated)));
    out.push_str(&format!("  Version: {}", record.version));
    out
}

pub fn render_list<'a>(records: impl Iterator<Item = (&'a WishId, &'a WishRecord)>) -> String {
    let lines: Vec<String> = records
        .map(|(id, record)| {
            format!(
                "{id}  {:>5.1}%  {:>3}  {}",
                record.current_probability,
                record.supporter_count(),
                truncate(&record.text, 60)
            )
        })
        .collect();
    if lines.is_empty() {
        return "No wishes yet".into();
    }
    lines.join("\n")
}

pub fn render_support(
    id: &WishId,
    supporter: &SupporterId,
    increment: Increment,
    outcome: &SupportOutcome,
) -> String {
    match *outcome {
        SupportOutcome::Accepted { probability, saved } => {
            let mut out = format!(
                "✓ Added +{increment}% luck to {id}. Probability now {probability:.1}%\n  Supporter: {supporter}"
            );
            if !saved {
                out.push_str("\n  ⚠ the store could not be written; this support may be lost");
            }
            out
        }
        SupportOutcome::AlreadySupported { probability } => format!(
            "{supporter} already supported {id}. Probability is {probability:.1}%"
        ),
        SupportOutcome::NotFound => render_not_found(id),
    }
}

pub fn render_not_found(id: &WishId) -> String {
    format!("Wish not found: {id}. Please make a new wish.")
}

pub fn format_time(at: WallClock) -> String {
    let nanos = i128::from(at.0) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| format!("{:.3}", at.as_secs_f64()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{cut}…")
}
