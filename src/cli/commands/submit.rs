use serde_json::json;

use super::super::render;
use super::super::{CliResult, Ctx, Exit, print_json, print_line};
use crate::service::Submission;

pub(crate) fn handle(ctx: &Ctx, text: &str) -> CliResult {
    match ctx.service.submit(text)? {
        Submission::Created {
            wish_id,
            record,
            sentiment,
            share_url,
            saved,
        } => {
            if ctx.json {
                print_json(&json!({
                    "status": "created",
                    "wish_id": wish_id,
                    "record": record,
                    "sentiment": sentiment,
                    "share_url": share_url.as_ref().map(|url| url.as_str()),
                    "saved": saved,
                }))?;
            } else {
                print_line(&render::render_created(
                    &wish_id,
                    &record,
                    &sentiment,
                    share_url.as_ref(),
                    saved,
                ))?;
            }
            Ok(Exit::Success)
        }
        Submission::Rejected { sentiment } => {
            if ctx.json {
                print_json(&json!({
                    "status": "rejected",
                    "sentiment": sentiment,
                }))?;
            } else {
                print_line(&render::render_rejected(&sentiment))?;
            }
            Ok(Exit::Rejected)
        }
    }
}
