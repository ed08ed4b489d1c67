use serde_json::json;

use super::super::render;
use super::super::{CliResult, Ctx, Exit, print_json, print_line};
use crate::core::initial_probability;
use crate::sentiment;

pub(crate) fn handle(ctx: &Ctx, text: &str) -> CliResult {
    let sentiment = sentiment::score(text);
    let initial = initial_probability(sentiment.confidence);

    if ctx.json {
        print_json(&json!({
            "label": sentiment.label,
            "confidence": sentiment.confidence,
            "initial_probability": initial,
        }))?;
    } else {
        print_line(&render::render_score(&sentiment, initial))?;
    }
    Ok(Exit::Success)
}
