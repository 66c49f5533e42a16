//! Output formatting utilities

use colored::*;
use integrator_core::{EventOutcome, RecordedAction};
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::error::CliResult;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Render a value as JSON or YAML; `None` for table output.
pub fn render<T: Serialize>(data: &T, format: OutputFormat) -> CliResult<Option<String>> {
    Ok(match format {
        OutputFormat::Table => None,
        OutputFormat::Json => Some(serde_json::to_string_pretty(data)?),
        OutputFormat::Yaml => Some(serde_yaml::to_string(data)?),
    })
}

/// Print a list of rows in the specified format
pub fn print_rows<T: Serialize + Tabled>(rows: Vec<T>, format: OutputFormat) -> CliResult<()> {
    match render(&rows, format)? {
        Some(text) => println!("{}", text),
        None if rows.is_empty() => println!("{}", "No relations".dimmed()),
        None => println!("{}", Table::new(rows)),
    }
    Ok(())
}

/// Print the outcome of one dispatched event
pub fn print_outcome(outcome: &EventOutcome, format: OutputFormat) -> CliResult<()> {
    if let Some(text) = render(outcome, format)? {
        println!("{}", text);
        return Ok(());
    }
    match outcome {
        EventOutcome::Synced(report) => {
            print_success(&format!(
                "credentials synced from relation {} ({} cache entries changed)",
                report.relation, report.cache_changes
            ));
        }
        EventOutcome::Deferred(reason) => print_warning(&format!("deferred: {}", reason)),
        EventOutcome::Action { name, record } => print_action(name.as_str(), record),
        EventOutcome::Ignored => println!("{}", "event ignored".dimmed()),
    }
    Ok(())
}

/// Print a batch of outcomes. JSON and YAML emit a single document.
pub fn print_outcomes(
    outcomes: &[EventOutcome],
    summary: &str,
    format: OutputFormat,
) -> CliResult<()> {
    if let Some(text) = render(&outcomes, format)? {
        println!("{}", text);
        return Ok(());
    }
    print_success(summary);
    for outcome in outcomes {
        print_outcome(outcome, format)?;
    }
    Ok(())
}

fn print_action(name: &str, record: &RecordedAction) {
    for line in &record.logs {
        print_info(line);
    }
    if let Some(results) = &record.results {
        print_success(name);
        for (key, value) in results {
            println!("  {}: {}", key.bold(), value);
        }
    }
    if let Some(failure) = &record.failure {
        print_error(failure);
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}
