use serde_json::json;

use super::super::render;
use super::super::{CliResult, Ctx, Exit, SupportArgs, parse_wish_id, print_json, print_line};
use crate::core::{Increment, SupporterId};
use crate::ledger::SupportOutcome;

pub(crate) fn handle(ctx: &Ctx, args: SupportArgs) -> CliResult {
    let id = parse_wish_id(&args.id)?;
    let supporter = match args.supporter {
        Some(raw) => SupporterId::new(raw)?,
        None => SupporterId::generate(),
    };
    let receipt = match args.increment {
        Some(points) => ctx
            .service
            .support_with(&id, Increment::new(points)?, &supporter),
        None => ctx.service.support(&id, &supporter),
    };

    if ctx.json {
        let (status, saved) = match receipt.outcome {
            SupportOutcome::Accepted { saved, .. } => ("accepted", saved),
            SupportOutcome::AlreadySupported { .. } => ("already_supported", true),
            SupportOutcome::NotFound => ("not_found", true),
        };
        print_json(&json!({
            "wish_id": id,
            "supporter": supporter,
            "increment": receipt.increment.value(),
            "status": status,
            "accepted": receipt.outcome.accepted(),
            "probability": receipt.outcome.probability(),
            "saved": saved,
        }))?;
    } else {
        print_line(&render::render_support(
            &id,
            &supporter,
            receipt.increment,
            &receipt.outcome,
        ))?;
    }

    Ok(match receipt.outcome {
        SupportOutcome::NotFound => Exit::NotFound,
        _ => Exit::Success,
    })
}
