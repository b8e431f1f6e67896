//! CLI theme and styling.

use colored::Colorize;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format an info message.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "━".repeat(60).dimmed().to_string()
    }

    /// Format a key-value pair.
    pub(crate) fn kv(key: &str, value: &str) -> String {
        format!("  {:<12} {}", format!("{key}:").bold(), value)
    }

    /// Shorten a hex digest for tables.
    pub(crate) fn short_hash(hash: &str) -> String {
        let short = hash.get(..12).unwrap_or(hash);
        format!("{}", short.cyan())
    }

    /// Format a Unix timestamp in seconds.
    pub(crate) fn timestamp(secs: Option<i64>) -> String {
        secs.and_then(|s| chrono::DateTime::from_timestamp(s, 0))
            .map_or_else(
                || "-".to_string(),
                |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            )
            .dimmed()
            .to_string()
    }

    /// `OK` or `FAIL`.
    pub(crate) fn verdict(ok: bool) -> String {
        if ok {
            "OK".green().to_string()
        } else {
            "FAIL".red().to_string()
        }
    }
}
