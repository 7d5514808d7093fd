//! Terminal output helpers for command implementations.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::validate::Severity;

/// Print a value as pretty JSON on stdout.
pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a bold pass/fail status line.
pub fn print_status(ok: bool, message: &str) {
    if ok {
        println!("{}", message.green().bold());
    } else {
        println!("{}", message.red().bold());
    }
}

/// Print a section heading tinted by the worst severity it reports.
pub fn print_section(severity: Severity, heading: &str) {
    match severity {
        Severity::Error => println!("{}", heading.red()),
        Severity::Warning => println!("{}", heading.yellow()),
        Severity::Info => println!("{heading}"),
    }
}

/// Print a warning line.
pub fn print_warning(message: &str) {
    println!("{}", format!("Warning: {message}").yellow());
}
