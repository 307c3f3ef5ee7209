//! Stderr diagnostics channel.
//!
//! Everything reported here is non-fatal: decode failures, front-end parse
//! diagnostics, dropped duplicates. Fatal configuration errors go through
//! the error types instead and abort the run.

use colored::Colorize;

/// Progress reporting (one line per processed header).
pub fn info(msg: impl AsRef<str>) {
    eprintln!("{}", msg.as_ref());
}

/// Observable-but-expected conditions (duplicate names, unresolved alias bases).
pub fn note(msg: impl AsRef<str>) {
    eprintln!("{} {}", "note:".cyan(), msg.as_ref());
}

/// Degraded output (unknown type spellings, front-end complaints).
pub fn warn(msg: impl AsRef<str>) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg.as_ref());
}
