// Report generation from a finished crawl session

use crate::crawl::extract_url_path;
use colored::Colorize;
use delve_crawler::{CrawlSummary, PageRecord, PageStatus};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

/// Render `summary` in the requested format. `color` only affects text.
pub fn render_report(
    summary: &CrawlSummary,
    output_dir: &Path,
    format: ReportFormat,
    color: bool,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(summary, output_dir, color)),
        ReportFormat::Json => generate_json_report(summary, output_dir),
    }
}

pub fn generate_text_report(summary: &CrawlSummary, output_dir: &Path, color: bool) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push('\n');
    report.push_str("                             DELVE CRAWL REPORT\n");
    report.push_str(RULE);
    report.push_str("\n\n");

    report.push_str(&format!("Seed:         {}\n", summary.seed));
    report.push_str(&format!("Max depth:    {}\n", summary.max_depth));
    report.push_str(&format!("Status:       {}\n", session_status(summary)));
    report.push_str(&format!("Output:       {}\n", output_dir.display()));
    report.push('\n');

    report.push_str("# Summary:\n");
    report.push_str(&format!("  Pages attempted:     {}\n", summary.pages.len()));
    report.push_str(&format!("  Pages saved:         {}\n", summary.saved_count()));
    report.push_str(&format!("  Pages failed:        {}\n", summary.failed_count()));
    report.push_str(&format!("  Duplicates skipped:  {}\n", summary.duplicates_skipped));
    report.push('\n');

    if summary.pages.is_empty() {
        report.push_str("No pages were fetched.\n");
        return report;
    }

    report.push_str(RULE);
    report.push('\n');
    report.push_str("PAGES\n");
    report.push_str(RULE);
    report.push_str("\n\n");

    for page in &summary.pages {
        let indent = "  ".repeat(page.depth);
        report.push_str(&format!(
            "  {:>4} {} {}{}\n",
            page.id,
            status_label(&page.status, color),
            indent,
            extract_url_path(&page.url)
        ));
    }
    report.push('\n');

    report
}

pub fn generate_json_report(
    summary: &CrawlSummary,
    output_dir: &Path,
) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Delve",
                "version": env!("CARGO_PKG_VERSION"),
                "format": "json"
            },
            "session": {
                "seed": summary.seed,
                "max_depth": summary.max_depth,
                "status": session_status(summary),
                "output": output_dir.display().to_string()
            },
            "summary": {
                "pages_attempted": summary.pages.len(),
                "pages_saved": summary.saved_count(),
                "pages_failed": summary.failed_count(),
                "duplicates_skipped": summary.duplicates_skipped
            },
            "pages": summary.pages.iter().map(page_json).collect::<Vec<_>>()
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn page_json(page: &PageRecord) -> serde_json::Value {
    serde_json::json!({
        "id": page.id,
        "url": page.url,
        "depth": page.depth,
        "parent": page.parent,
        "status": page.status,
        "content_length": page.content_length,
        "response_time_ms": page.response_time.as_millis() as u64,
        "links_found": page.links_found.len()
    })
}

fn session_status(summary: &CrawlSummary) -> &'static str {
    if summary.cancelled {
        "cancelled"
    } else if summary.seed_unreachable {
        "seed unreachable"
    } else {
        "complete"
    }
}

fn status_label(status: &PageStatus, color: bool) -> String {
    let label = match status {
        PageStatus::Saved => "saved".to_string(),
        PageStatus::HttpError(code) => format!("http {}", code),
        PageStatus::NetworkError(_) => "network".to_string(),
        PageStatus::StorageError(_) => "storage".to_string(),
    };
    let padded = format!("{:<8}", label);

    if !color {
        return padded;
    }
    match status {
        PageStatus::Saved => padded.green().to_string(),
        PageStatus::HttpError(400..=499) => padded.yellow().to_string(),
        _ => padded.red().to_string(),
    }
}
