use serde_json::json;

use super::super::render;
use super::super::{CliResult, Ctx, Exit, parse_wish_id, print_json, print_line};

pub(crate) fn handle(ctx: &Ctx, raw_id: &str) -> CliResult {
    let id = parse_wish_id(raw_id)?;
    let Some(record) = ctx.service.ledger().get(&id) else {
        if ctx.json {
            print_json(&json!({ "wish_id": id, "found": false }))?;
        } else {
            print_line(&render::render_not_found(&id))?;
        }
        return Ok(Exit::NotFound);
    };

    if ctx.json {
        print_json(&json!({ "wish_id": id, "found": true, "record": record }))?;
    } else {
        print_line(&render::render_record(&id, &record))?;
    }
    Ok(Exit::Success)
}

pub(crate) fn handle_list(ctx: &Ctx) -> CliResult {
    let collection = ctx.service.ledger().snapshot();
    if ctx.json {
        let wishes: serde_json::Map<String, serde_json::Value> = collection
            .iter()
            .map(|(id, record)| serde_json::to_value(record).map(|value| (id.to_string(), value)))
            .collect::<Result<_, serde_json::Error>>()?;
        print_json(&serde_json::Value::Object(wishes))?;
    } else {
        print_line(&render::render_list(collection.iter()))?;
    }
    Ok(Exit::Success)
}
