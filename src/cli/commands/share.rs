use serde_json::json;

use super::super::render;
use super::super::{CliResult, Ctx, Exit, parse_wish_id, print_json, print_line};
use crate::service::Visit;

pub(crate) fn handle(ctx: &Ctx, raw_id: &str) -> CliResult {
    let id = parse_wish_id(raw_id)?;
    let Some(url) = ctx.service.share_link(&id)? else {
        if ctx.json {
            print_json(&json!({ "wish_id": id, "found": false }))?;
        } else {
            print_line(&render::render_not_found(&id))?;
        }
        return Ok(Exit::NotFound);
    };

    if ctx.json {
        print_json(&json!({ "wish_id": id, "found": true, "share_url": url.as_str() }))?;
    } else {
        print_line(url.as_str())?;
    }
    Ok(Exit::Success)
}

pub(crate) fn handle_visit(ctx: &Ctx, link: &str) -> CliResult {
    let visit = ctx.service.visit(link)?;
    let status = match &visit {
        Visit::Found { .. } => "found",
        Visit::Bootstrapped { .. } => "bootstrapped",
        Visit::Missing { .. } => "missing",
    };

    if ctx.json {
        let saved = match &visit {
            Visit::Bootstrapped { saved, .. } => *saved,
            _ => true,
        };
        print_json(&json!({
            "wish_id": visit.wish_id(),
            "status": status,
            "record": visit.record(),
            "saved": saved,
        }))?;
    } else {
        match visit.record() {
            Some(record) => {
                let mut out = render::render_record(visit.wish_id(), record);
                if matches!(visit, Visit::Bootstrapped { .. }) {
                    out.push_str("\n  (restored from the share link)");
                }
                print_line(&out)?;
            }
            None => print_line(&render::render_not_found(visit.wish_id()))?,
        }
    }

    Ok(match visit {
        Visit::Missing { .. } => Exit::NotFound,
        _ => Exit::Success,
    })
}
