//! JSON output formatting

use super::DrawReport;
use crate::Result;
use anyhow::Context;

/// Serialize a draw report as pretty-printed JSON
pub fn to_json(report: &DrawReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize draw report")
}

/// Print a draw report to stdout as JSON
pub fn print_report(report: &DrawReport) -> Result<()> {
    println!("{}", to_json(report)?);
    Ok(())
}
