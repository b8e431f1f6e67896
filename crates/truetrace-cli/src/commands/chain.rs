//! Chain command - inspect, verify and re-sign the stored chain.

use std::process::ExitCode;

use colored::Colorize;
use truetrace_chain::{Event, HealthStatus, StoreHealth};

use crate::context::{Context, display};
use crate::formatter::print_json;
use crate::theme::Theme;

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_table(events: &[(usize, Event)]) {
    println!(
        "{:>5}  {:<19}  {:<20}  {:<16}  {}",
        "INDEX".dimmed(),
        "TIMESTAMP".dimmed(),
        "TYPE".dimmed(),
        "EVENT ID".dimmed(),
        "HASH".dimmed()
    );
    println!("{}", Theme::separator());
    for (index, event) in events {
        println!(
            "{:>5}  {}  {:<20}  {:<16}  {}",
            index,
            Theme::timestamp(event.timestamp()),
            event.event_type().unwrap_or("-"),
            event.event_id().unwrap_or("-"),
            Theme::short_hash(event.hash().unwrap_or("-"))
        );
    }
}

fn warn_store_health(health: &StoreHealth) {
    if !health.is_healthy() {
        println!("{}", Theme::warning(&format!("Chain store is {health}")));
    }
}

/// Show one event or list the chain.
pub(crate) fn show_chain(ctx: &Context, index: Option<usize>, latest: bool) -> anyhow::Result<()> {
    let log = ctx.chain_log();

    let single = match (index, latest) {
        (Some(index), _) => Some(log.get(index)?),
        (None, true) => match log.latest()? {
            Some(event) => Some(event),
            None => {
                if ctx.json() {
                    return print_json(&serde_json::Value::Null);
                }
                println!("{}", Theme::info("No events yet"));
                return Ok(());
            },
        },
        (None, false) => None,
    };

    if let Some(event) = single {
        if ctx.json() {
            return print_json(&event);
        }
        println!("{}", event.to_pretty_json()?);
        return Ok(());
    }

    let loaded = log.load()?;
    if ctx.json() {
        return print_json(&loaded.events);
    }

    warn_store_health(&loaded.health);
    if loaded.events.is_empty() {
        println!("{}", Theme::info("No events yet"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Event Chain"));
    println!("{}", Theme::dimmed(&display(&ctx.chain_path())));
    print_table(&loaded.events.into_iter().enumerate().collect::<Vec<_>>());
    println!();
    Ok(())
}

/// Case-insensitive search over the stored events.
pub(crate) fn search_chain(ctx: &Context, query: &str) -> anyhow::Result<()> {
    let hits: Vec<(usize, Event)> = ctx
        .chain_log()
        .read_all()?
        .into_iter()
        .enumerate()
        .filter(|(_, e)| e.matches(query))
        .collect();

    if ctx.json() {
        let events: Vec<&Event> = hits.iter().map(|(_, e)| e).collect();
        return print_json(&events);
    }

    if hits.is_empty() {
        println!("{}", Theme::info(&format!("No events match '{query}'")));
        return Ok(());
    }
    println!(
        "\n{}",
        Theme::header(&format!("{} event(s) matching '{query}'", hits.len()))
    );
    print_table(&hits);
    println!();
    Ok(())
}

/// Per-event verdicts.
pub(crate) fn verify_chain(ctx: &Context) -> anyhow::Result<ExitCode> {
    let listing = ctx.chain_log().verify_events()?;
    let all_valid = listing.results.iter().all(|r| r.valid);

    if ctx.json() {
        print_json(&listing)?;
        return Ok(exit_code(all_valid));
    }

    println!("\n{}", Theme::header("Event Verification"));
    for (index, verdict) in listing.results.iter().enumerate() {
        println!(
            "{:>5}  {:<16}  {}",
            index,
            verdict.event_id.as_deref().unwrap_or("-"),
            Theme::verdict(verdict.valid)
        );
        for error in verdict.errors.iter().flatten() {
            println!("         - {error}");
        }
    }

    let valid = listing.results.iter().filter(|r| r.valid).count();
    if all_valid {
        println!(
            "{}",
            Theme::success(&format!("All {} events valid", listing.count))
        );
    } else {
        println!(
            "{}",
            Theme::warning(&format!("{valid}/{} events valid", listing.count))
        );
    }
    Ok(exit_code(all_valid))
}

/// Full diagnostics, including linkage.
pub(crate) fn diagnose_chain(ctx: &Context) -> anyhow::Result<ExitCode> {
    let log = ctx.chain_log();
    let loaded = log.load()?;
    let report = truetrace_chain::diagnose_chain(&loaded.events, log.validator());

    if ctx.json() {
        print_json(&report)?;
        return Ok(exit_code(report.is_ok()));
    }

    warn_store_health(&loaded.health);
    println!("\n{}", Theme::header("Chain Diagnostics"));
    println!("{}", Theme::kv("Events", &report.event_count.to_string()));

    if report.is_ok() {
        println!("{}", Theme::kv("Integrity", &"OK".green().to_string()));
        println!();
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "{}",
        Theme::kv(
            "Integrity",
            &format!(
                "{} ({} events, {} issues)",
                "ISSUES".red(),
                report.issues_found,
                report.total_issues()
            )
        )
    );
    for detail in &report.details {
        println!(
            "\n{}",
            Theme::error(&format!(
                "#{} {}",
                detail.index,
                detail.event_id.as_deref().unwrap_or("<no event_id>")
            ))
        );
        for issue in &detail.issues {
            println!("  - {issue}");
        }
        println!("  {}", Theme::dimmed(&format!("computed {}", detail.computed_hash)));
    }
    println!();
    Ok(ExitCode::FAILURE)
}

/// Quick check of the latest event.
pub(crate) fn chain_health(ctx: &Context) -> anyhow::Result<ExitCode> {
    let report = ctx.chain_log().health()?;
    let ok = report.status == HealthStatus::Ok;

    if ctx.json() {
        print_json(&report)?;
        return Ok(exit_code(ok));
    }

    if ok {
        println!("{}", Theme::success(&report.message));
    } else {
        println!("{}", Theme::error(&report.message));
        for error in report.errors.iter().flatten() {
            println!("  - {error}");
        }
    }
    Ok(exit_code(ok))
}

/// Rebuild the whole chain under the configured key.
pub(crate) fn resign_chain(ctx: &Context, yes: bool) -> anyhow::Result<()> {
    let key = ctx.signing_key()?;
    let log = ctx.chain_log();

    if !yes {
        if ctx.json() {
            anyhow::bail!("re-signing requires --yes with --format json");
        }
        let count = log.len()?;
        println!(
            "{}",
            Theme::warning(&format!(
                "This re-issues all {count} events under key {}.",
                key.key_id_hex()
            ))
        );
        println!(
            "{}",
            Theme::warning("Existing signatures are discarded; authorship is not preserved.")
        );
        println!(
            "{}",
            Theme::info(&format!(
                "The current chain is copied to {} first, unless a backup already exists.",
                display(&truetrace_cli::config_bridge::to_storage(ctx.config(), &ctx.base).backup_path())
            ))
        );
        println!();

        let confirm = dialoguer::Confirm::new()
            .with_prompt("Re-sign the chain?")
            .default(false)
            .interact()?;
        if !confirm {
            println!("{}", Theme::info("Aborted."));
            return Ok(());
        }
    }

    let outcome = log.resign(&key)?;

    if ctx.json() {
        return print_json(&serde_json::json!({
            "events_resigned": outcome.events_resigned,
            "backup": outcome.backup.to_string(),
            "public_key": outcome.public_key,
        }));
    }

    println!(
        "{}",
        Theme::success(&format!("Re-signed {} events", outcome.events_resigned))
    );
    println!("{}", Theme::kv("Backup", &outcome.backup.to_string()));
    println!("{}", Theme::kv("Public key", &outcome.public_key));
    Ok(())
}
