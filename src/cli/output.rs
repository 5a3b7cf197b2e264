//! Shared output helpers for human and robot modes.

use colored::Colorize;
use serde::Serialize;

use crate::catalog::{SelectionIssue, SelectionReport};
use crate::error::{Result, SmithError};

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)
        .map_err(|err| SmithError::Config(format!("serialize output: {err}")))?;
    println!("{payload}");
    Ok(())
}

/// Robot-mode error payload written to stdout.
#[must_use]
pub fn robot_error(err: &SmithError) -> serde_json::Value {
    serde_json::json!({
        "error": true,
        "code": err.code(),
        "message": err.to_string(),
    })
}

pub fn print_issue(label: &str, issue: &SelectionIssue) {
    let tag = match label {
        "error" => label.red().bold(),
        "warning" => label.yellow().bold(),
        _ => label.cyan(),
    };
    println!("  {tag} {}", issue.message);
}

pub fn print_report(report: &SelectionReport) {
    for issue in &report.errors {
        print_issue("error", issue);
    }
    for issue in &report.warnings {
        print_issue("warning", issue);
    }
    for issue in &report.suggestions {
        print_issue("hint", issue);
    }
}
