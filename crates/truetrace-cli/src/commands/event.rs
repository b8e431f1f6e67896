//! Event command - create and validate single events.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context as _;
use serde_json::Value;
use truetrace_chain::{ChainError, Event, NewEvent};

use crate::context::{Context, display};
use crate::formatter::print_json;
use crate::theme::Theme;

/// Build, seal, validate and append a new event.
pub(crate) fn create_event(
    ctx: &Context,
    event_type: &str,
    payload: &str,
    origin: Option<&str>,
) -> anyhow::Result<ExitCode> {
    let payload: Value = serde_json::from_str(payload).context("payload is not valid JSON")?;
    let log = ctx.signed_chain_log()?;

    let mut new_event = NewEvent::new(event_type, payload);
    if let Some(origin) = origin {
        new_event = new_event.origin(origin);
    }

    let event = match log.create(new_event) {
        Ok(event) => event,
        Err(ChainError::Rejected { errors }) => {
            if ctx.json() {
                print_json(&serde_json::json!({ "stored": false, "errors": errors }))?;
            } else {
                println!("{}", Theme::error("Event rejected:"));
                for error in &errors {
                    println!("  - {error}");
                }
            }
            return Ok(ExitCode::FAILURE);
        },
        Err(e) => return Err(e.into()),
    };

    if ctx.json() {
        print_json(&event)?;
    } else {
        println!(
            "{}",
            Theme::success(&format!(
                "Stored {} ({})",
                event.event_id().unwrap_or_default(),
                Theme::short_hash(event.hash().unwrap_or_default())
            ))
        );
        println!("{}", event.to_pretty_json()?);
    }
    Ok(ExitCode::SUCCESS)
}

/// Validate a single event document without touching the chain.
pub(crate) fn validate_file(ctx: &Context, path: &Path) -> anyhow::Result<ExitCode> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", display(path)))?;
    let event = Event::from_json_str(&text)
        .with_context(|| format!("{} is not a JSON object", display(path)))?;

    let report = ctx.validator().validate(&event);
    let code = if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    };

    if ctx.json() {
        print_json(&report)?;
        return Ok(code);
    }

    let label = event.event_id().unwrap_or("<no event_id>");
    if report.is_valid() {
        println!("{}", Theme::success(&format!("{label} is valid")));
    } else {
        println!("{}", Theme::error(&format!("{label} is invalid:")));
        for error in report.error_codes() {
            println!("  - {error}");
        }
    }
    println!("{}", Theme::kv("Computed", &report.computed_hash));
    Ok(code)
}
