use colored::Colorize;
use connector_core::{RateLimitDescription, SyncFailure};
use serde::Serialize;

pub fn header(title: &str) {
    println!("{}", title.bold().underline());
}

pub fn subheader(title: &str) {
    println!("{}", title.bold());
}

pub fn hint(msg: &str) {
    println!("{} {}", "hint:".cyan().bold(), msg.dimmed());
}

pub fn warn(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

pub fn json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One counted line of a sync summary, e.g. `✓ 12 board`.
pub fn tally(count: u32, what: &str) {
    println!("  {} {} {}", "✓".green(), count, what);
}

pub fn rate_limit(description: &RateLimitDescription) {
    if let Some(line) = rate_limit_line(description) {
        println!("  {} {}", "•".dimmed(), line);
    }
}

pub fn sync_failure(failure: &SyncFailure) {
    warn(&failure_line(failure));
}

/// `None` unless Trello reported both the window size and what is left of it.
pub fn rate_limit_line(description: &RateLimitDescription) -> Option<String> {
    let (remaining, limit) = (description.remaining?, description.limit?);
    let mut line = format!("{remaining}/{limit} requests left in the current window");
    if let Some(reset_at) = description.reset_at {
        line.push_str(&format!(", resets at {}", reset_at.format("%H:%M:%S UTC")));
    }
    Some(line)
}

pub fn failure_line(failure: &SyncFailure) -> String {
    match &failure.resource_id {
        Some(id) => format!("{} sync failed at {}: {}", failure.resource_type, id, failure.error),
        None => format!("{} sync failed: {}", failure.resource_type, failure.error)
    }
}
