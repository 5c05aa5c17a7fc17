//! Rendering of a completed run, as plain text or JSON.

use serde::Serialize;
use serde_json::json;

use crate::engine::MinimizationReport;

/// How the final report is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    Text,
    /// A single JSON object on stdout.
    Json,
}

/// Extra, `--verbose`-only figures appended to the report.
#[derive(Debug, Clone, Serialize)]
pub struct VerboseStats {
    /// Distinct verdicts recorded in the outcome cache.
    pub cache_entries: usize,
    /// Wall-clock duration of the run, in milliseconds.
    pub elapsed_ms: u128,
}

/// Renders a successful run's report.
#[must_use]
pub fn render_report(
    report: &MinimizationReport,
    format: OutputFormat,
    output_path: &std::path::Path,
    verbose: Option<&VerboseStats>,
) -> String {
    match format {
        OutputFormat::Text => render_text(report, output_path, verbose),
        OutputFormat::Json => render_json(report, output_path, verbose, None),
    }
}

/// Renders a failed run's diagnostic. For `--format json`, the error is
/// embedded as an `"error"` field rather than only printed to stderr, so
/// scripted callers never need to scrape human text (§7, ambient mapping).
#[must_use]
pub fn render_error(format: OutputFormat, message: &str) -> Option<String> {
    match format {
        OutputFormat::Text => None,
        OutputFormat::Json => Some(json!({ "success": false, "error": message }).to_string()),
    }
}

fn render_text(
    report: &MinimizationReport,
    output_path: &std::path::Path,
    verbose: Option<&VerboseStats>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Reduced {} units to {} units ({:.1}% smaller) in {} iteration{}\n",
        report.original_unit_count,
        report.final_unit_count,
        report.reduction_percent(),
        report.iterations,
        if report.iterations == 1 { "" } else { "s" },
    ));
    out.push_str(&format!("Result written to: {}\n", output_path.display()));
    if let Some(stats) = verbose {
        out.push_str(&format!(
            "Cache entries: {} (run time: {} ms)\n",
            stats.cache_entries, stats.elapsed_ms
        ));
    }
    out
}

fn render_json(
    report: &MinimizationReport,
    output_path: &std::path::Path,
    verbose: Option<&VerboseStats>,
    error: Option<&str>,
) -> String {
    let mut value = json!({
        "success": error.is_none(),
        "original_unit_count": report.original_unit_count,
        "final_unit_count": report.final_unit_count,
        "reduction_percent": report.reduction_percent(),
        "iterations": report.iterations,
        "output_path": output_path.to_string_lossy(),
    });
    if let Some(stats) = verbose {
        value["verbose"] = json!(stats);
    }
    if let Some(message) = error {
        value["error"] = json!(message);
    }
    value.to_string()
}
