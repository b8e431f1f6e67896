//! Config command - show the resolved configuration.

use truetrace_config::ShowFormat;

use crate::context::Context;

/// Print the resolved configuration with per-field sources.
pub(crate) fn show_config(ctx: &Context) -> anyhow::Result<()> {
    let format = if ctx.json() {
        ShowFormat::Json
    } else {
        ShowFormat::Toml
    };
    print!("{}", ctx.resolved.show(format)?);
    if ctx.json() {
        println!();
    }
    Ok(())
}
