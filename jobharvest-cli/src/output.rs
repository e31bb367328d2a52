//! Run summary formatting.

use anyhow::Result;
use clap::ValueEnum;

use crate::harvest::RunSummary;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Renders the summary in the requested format.
pub fn render(summary: &RunSummary, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(summary)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
    }
}

fn render_text(summary: &RunSummary) -> String {
    let mut lines = Vec::new();

    let mode = if summary.resumed { "resumed" } else { "fresh" };
    lines.push(format!(
        "Run ({mode}): {} records, {} resolved, {} pending",
        summary.total, summary.resolved, summary.unresolved
    ));

    if let (Some(pages), Some(reason)) = (summary.pages_visited, &summary.stop_reason) {
        lines.push(format!("  Listing: {pages} pages, stopped: {reason}"));
    }

    if summary.details_fetched {
        let mut line = format!(
            "  Details: {} attempted, {} ok, {} failed",
            summary.attempted, summary.succeeded, summary.failed
        );
        if summary.stopped_by_gate {
            line.push_str(" (stopped at chunk boundary)");
        } else if summary.limit_reached {
            line.push_str(" (limit reached)");
        }
        lines.push(line);
    } else {
        lines.push("  Details: skipped".to_string());
    }

    match (&summary.json_path, &summary.csv_path) {
        (Some(json), Some(csv)) => {
            lines.push(format!("  Saved: {}", json.display()));
            lines.push(format!("         {}", csv.display()));
        }
        _ => lines.push("  Saved: nothing to save".to_string()),
    }

    lines.join("\n")
}
